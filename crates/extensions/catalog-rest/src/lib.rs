//! # cronfleet REST adapters
//!
//! HTTP clients for the remote job catalog and the operation installation
//! service.

mod catalog;
mod endpoint;
mod installer;

pub use catalog::RestJobCatalog;
pub use installer::RestOperationInstaller;
