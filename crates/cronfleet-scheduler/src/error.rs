//! Scheduler error types.

use thiserror::Error;

use cronfleet_protocols::{BusError, CatalogError, PartitionError};

/// Errors raised by a trigger engine when registering a trigger.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The cron expression could not be parsed.
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    /// The expression parses but has no future fire time.
    #[error("Cron expression '{0}' will never fire")]
    NeverFires(String),

    /// A trigger with the same key is already registered.
    #[error("Trigger already scheduled: {0}")]
    AlreadyScheduled(String),

    /// The engine has been shut down.
    #[error("Trigger engine is shut down")]
    Shutdown,
}

/// Scheduler error types.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Invalid partition: {0}")]
    InvalidPartition(#[from] PartitionError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Message bus error: {0}")]
    Bus(#[from] BusError),

    #[error("Missing scheduler component: {0}")]
    MissingComponent(&'static str),

    #[error("Scheduler already started")]
    AlreadyStarted,
}
