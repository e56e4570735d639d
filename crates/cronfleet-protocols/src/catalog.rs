//! Job catalog protocol definitions.
//!
//! Lookups happen inside a read session: a read-only unit of work that the
//! caller always releases with [`CatalogSession::rollback`]. Nothing the
//! scheduler does through a session is ever committed.

use async_trait::async_trait;

use crate::error::CatalogError;
use crate::job::Job;
use crate::partition::PartitionDescriptor;

/// Read access to the job catalog.
#[async_trait]
pub trait JobCatalog: Send + Sync {
    /// Open a read-only session.
    async fn begin_read(&self) -> Result<Box<dyn CatalogSession>, CatalogError>;
}

/// A read-only unit of work against the catalog.
#[async_trait]
pub trait CatalogSession: Send {
    /// Look a job up by its code. `Ok(None)` if no such job exists.
    async fn find_by_code(&mut self, code: &str) -> Result<Option<Job>, CatalogError>;

    /// Release the session, discarding anything it opened.
    async fn rollback(self: Box<Self>) -> Result<(), CatalogError>;
}

/// Bulk ownership query evaluated by the backing store.
///
/// Used once at startup, bypassing per-job lookups on large catalogs.
#[async_trait]
pub trait OwnedJobIndex: Send + Sync {
    /// Codes of every persisted job owned by `partition`.
    async fn owned_job_codes(
        &self,
        partition: PartitionDescriptor,
    ) -> Result<Vec<String>, CatalogError>;
}
