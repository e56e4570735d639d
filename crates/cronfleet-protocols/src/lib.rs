//! # cronfleet Protocols
//!
//! Data model and collaborator protocols (traits) for the cronfleet
//! partitioned scheduler. Contains only interface definitions and plain
//! data - no scheduling logic.
//!
//! ## Core Traits
//!
//! - [`JobCatalog`] / [`CatalogSession`] - Read access to the job catalog
//! - [`OwnedJobIndex`] - Bulk ownership query against the backing store
//! - [`OperationInstaller`] - Remote execution of operation calls
//! - [`MessageBus`] / [`NotificationHandler`] - Change notification transport

pub mod catalog;
pub mod error;
pub mod job;
pub mod notification;
pub mod operation;
pub mod partition;

pub use catalog::{CatalogSession, JobCatalog, OwnedJobIndex};
pub use error::{BusError, CatalogError, OperationError, PartitionError};
pub use job::Job;
pub use notification::{
    ChangeKind, ChangeNotification, MessageBus, NotificationFilter, NotificationHandler,
    ResourceType, SubscriptionId,
};
pub use operation::{OperationCall, OperationInstaller};
pub use partition::PartitionDescriptor;
