//! Instance partition descriptor and the ownership predicate.
//!
//! Ownership is a pure function of `(id, total_instances)`:
//! `owner = (id mod N) + 1`. No coordination between instances is needed,
//! but changing `N` requires a synchronized restart of the whole fleet.

use serde::{Deserialize, Serialize};

use crate::error::PartitionError;

/// Position of this process within the fleet. Immutable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionDescriptor {
    instance_number: u32,
    total_instances: u32,
}

impl PartitionDescriptor {
    /// Create a descriptor for instance `instance_number` (1-based) of `total_instances`.
    pub fn new(instance_number: u32, total_instances: u32) -> Result<Self, PartitionError> {
        if total_instances == 0 {
            return Err(PartitionError::EmptyFleet);
        }
        if instance_number == 0 || instance_number > total_instances {
            return Err(PartitionError::InstanceOutOfRange {
                instance_number,
                total_instances,
            });
        }
        Ok(Self {
            instance_number,
            total_instances,
        })
    }

    /// A single-instance fleet that owns every persisted job.
    pub fn standalone() -> Self {
        Self {
            instance_number: 1,
            total_instances: 1,
        }
    }

    /// 1-based number of this instance.
    pub fn instance_number(&self) -> u32 {
        self.instance_number
    }

    /// Fleet size.
    pub fn total_instances(&self) -> u32 {
        self.total_instances
    }

    /// Instance owning the job with the given persisted ID, `None` for unpersisted jobs.
    pub fn owner_of(&self, id: u64) -> Option<u32> {
        if id == 0 {
            return None;
        }
        // The remainder is < total_instances, so it always fits in u32.
        Some((id % u64::from(self.total_instances)) as u32 + 1)
    }

    /// Whether this instance owns the job with the given persisted ID.
    pub fn owns(&self, id: u64) -> bool {
        self.owner_of(id) == Some(self.instance_number)
    }
}

impl std::fmt::Display for PartitionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.instance_number, self.total_instances)
    }
}
