//! # cronfleet Scheduler
//!
//! Partitioned cron scheduler core. Every instance of a fixed fleet runs one
//! [`PartitionedScheduler`]; together they run every catalog job on exactly
//! one instance.
//!
//! ## Architecture
//!
//! ```text
//!   notifications ──▶ CatalogReconciler ──▶ OwnershipResolver
//!   bootstrap ───────▶        │
//!                             ▼
//!                     LocalScheduleStore ──▶ TriggerEngine (cron)
//!                                                  │ fires
//!                                                  ▼
//!                                         ExecutionDispatcher ──▶ OperationInstaller
//! ```
//!
//! - **Partition function**: `owner = (id mod N) + 1`, see
//!   [`PartitionDescriptor`] and [`OwnershipResolver`].
//! - **Local schedule store**: one trigger per owned job code, in a trigger
//!   group private to this instance.
//! - **Reconciler**: bootstrap from the backing store, then react to
//!   create/update/delete notifications.
//! - **Dispatcher**: on each firing, re-read the job and submit its operation call.

pub mod bus;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod memory;
pub mod partition;
pub mod reconciler;
pub mod scheduler;
pub mod store;

mod session;

pub use bus::LocalMessageBus;
pub use dispatcher::{DispatchOutcome, DispatchStats, ExecutionContext, ExecutionDispatcher};
pub use engine::{CronTriggerEngine, FireTask, TriggerEngine, TriggerHandle, TriggerKey};
pub use error::{EngineError, SchedulerError};
pub use memory::{MemoryJobCatalog, RecordingOperationInstaller};
pub use partition::OwnershipResolver;
pub use reconciler::{BootstrapReport, CatalogReconciler};
pub use scheduler::{PartitionedScheduler, SchedulerBuilder, SchedulerStatus};
pub use store::{trigger_group, LocalScheduleStore, ScheduleOutcome};

pub use cronfleet_protocols::PartitionDescriptor;
