//! Ownership resolution.
//!
//! Decides whether this instance is responsible for a job. A job that is
//! already scheduled locally is ours without a catalog lookup; anything
//! else is resolved through the job's persisted ID.

use std::sync::Arc;

use tracing::{debug, warn};

use cronfleet_protocols::{CatalogSession, Job, PartitionDescriptor};

use crate::store::LocalScheduleStore;

/// Answers "is this instance responsible for that job?".
pub struct OwnershipResolver {
    partition: PartitionDescriptor,
    store: Arc<LocalScheduleStore>,
}

impl OwnershipResolver {
    pub fn new(partition: PartitionDescriptor, store: Arc<LocalScheduleStore>) -> Self {
        Self { partition, store }
    }

    pub fn partition(&self) -> PartitionDescriptor {
        self.partition
    }

    /// Pure ownership test on a persisted ID. Unpersisted IDs (0) are never owned.
    pub fn is_responsible_for_id(&self, id: u64) -> bool {
        self.partition.owns(id)
    }

    /// Resolve ownership of a job definition.
    ///
    /// Entry point for callers that already hold a [`Job`]; reconciliation
    /// works from codes and goes through [`Self::is_responsible_for_code`].
    /// Persisted jobs are decided by ID alone. An unpersisted job falls back
    /// to the code form, so it stays ours only if it is already scheduled here.
    pub async fn is_responsible_for_job(
        &self,
        job: &Job,
        session: &mut dyn CatalogSession,
    ) -> bool {
        if job.is_persisted() {
            self.is_responsible_for_id(job.id)
        } else {
            self.is_responsible_for_code(&job.code, session).await
        }
    }

    /// Resolve ownership of a job by code.
    ///
    /// Lookup misses and catalog failures both answer `false`.
    pub async fn is_responsible_for_code(
        &self,
        code: &str,
        session: &mut dyn CatalogSession,
    ) -> bool {
        if self.store.schedules_job(code).await {
            return true;
        }

        match session.find_by_code(code).await {
            Ok(Some(job)) => self.is_responsible_for_id(job.id),
            Ok(None) => {
                debug!("Job '{}' not found while resolving ownership", code);
                false
            }
            Err(e) => {
                warn!("Cannot resolve ownership of job '{}': {}", code, e);
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "partition_tests.rs"]
mod tests;
