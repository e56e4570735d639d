//! The owner command.

use cronfleet_protocols::PartitionDescriptor;

use crate::server::BoxError;

/// Render which instance of a fleet of `total` owns job `id`.
pub(crate) fn describe_owner(id: u64, total: u32) -> Result<String, BoxError> {
    let fleet = PartitionDescriptor::new(1, total)?;
    Ok(match fleet.owner_of(id) {
        Some(owner) => format!("job {} -> instance {}/{}", id, owner, total),
        None => format!("job {} is not persisted and has no owner", id),
    })
}
