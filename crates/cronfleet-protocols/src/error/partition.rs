//! Partition descriptor errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PartitionError {
    #[error("Fleet size must be at least 1")]
    EmptyFleet,

    #[error("Instance number {instance_number} is outside 1..={total_instances}")]
    InstanceOutOfRange {
        instance_number: u32,
        total_instances: u32,
    },
}
