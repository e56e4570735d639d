//! Catalog reconciler.
//!
//! Keeps the local schedule store in line with the catalog: a bootstrap
//! pass at startup schedules every owned job, then change notifications
//! keep the store current. Each notification is handled inside its own
//! read session, released by rollback whatever the outcome.
//!
//! The reconciler never hands an error back to the bus. A failed
//! notification is logged; the next create or update of the same job, or
//! the next restart, repairs the drift.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use cronfleet_protocols::{
    CatalogError, ChangeKind, ChangeNotification, JobCatalog, NotificationHandler,
    OwnedJobIndex, PartitionDescriptor, ResourceType,
};

use crate::partition::OwnershipResolver;
use crate::session;
use crate::store::{LocalScheduleStore, ScheduleOutcome};

/// Summary of a bootstrap pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    /// Owned jobs reported by the catalog.
    pub candidates: usize,
    pub scheduled: usize,
    /// Owned jobs left unscheduled (missing, malformed, never firing).
    pub skipped: usize,
}

/// Reacts to catalog changes for one instance.
pub struct CatalogReconciler {
    partition: PartitionDescriptor,
    store: Arc<LocalScheduleStore>,
    resolver: OwnershipResolver,
    catalog: Arc<dyn JobCatalog>,
    index: Arc<dyn OwnedJobIndex>,
}

impl CatalogReconciler {
    pub fn new(
        store: Arc<LocalScheduleStore>,
        catalog: Arc<dyn JobCatalog>,
        index: Arc<dyn OwnedJobIndex>,
    ) -> Self {
        let partition = store.partition();
        Self {
            partition,
            resolver: OwnershipResolver::new(partition, store.clone()),
            store,
            catalog,
            index,
        }
    }

    pub fn resolver(&self) -> &OwnershipResolver {
        &self.resolver
    }

    /// Schedule every job this instance owns.
    ///
    /// The only failure is the bulk ownership query itself; individual jobs
    /// that cannot be scheduled are counted as skipped.
    pub async fn bootstrap(&self) -> Result<BootstrapReport, CatalogError> {
        info!("Bootstrapping schedules for instance {}", self.partition);

        let codes = self.index.owned_job_codes(self.partition).await?;
        let mut report = BootstrapReport {
            candidates: codes.len(),
            ..Default::default()
        };

        for code in &codes {
            match self.store.start_scheduling_of_job(code).await {
                ScheduleOutcome::Scheduled => report.scheduled += 1,
                outcome => {
                    debug!("Bootstrap skipped job '{}': {:?}", code, outcome);
                    report.skipped += 1;
                }
            }
        }

        info!(
            "Bootstrap finished: {} owned, {} scheduled, {} skipped",
            report.candidates, report.scheduled, report.skipped
        );
        Ok(report)
    }

    /// A job was created. Returns whether it is now scheduled here.
    pub async fn on_created(&self, code: &str) -> bool {
        self.react(ChangeKind::Created, code).await
    }

    /// A job was updated. Returns whether it is now scheduled here.
    pub async fn on_updated(&self, code: &str) -> bool {
        self.react(ChangeKind::Updated, code).await
    }

    /// A job was deleted. Returns whether a local trigger was removed.
    pub async fn on_deleted(&self, code: &str) -> bool {
        self.react(ChangeKind::Deleted, code).await
    }

    async fn react(&self, kind: ChangeKind, code: &str) -> bool {
        let mut session = match self.catalog.begin_read().await {
            Ok(session) => session,
            Err(e) => {
                error!("Cannot open catalog session for {} job '{}': {}", kind, code, e);
                return false;
            }
        };

        let responsible = self
            .resolver
            .is_responsible_for_code(code, session.as_mut())
            .await;

        let changed = if !responsible {
            debug!("Ignoring {} job '{}', owned elsewhere", kind, code);
            false
        } else {
            match kind {
                ChangeKind::Created => {
                    self.store.start_scheduling_of_job(code).await == ScheduleOutcome::Scheduled
                }
                ChangeKind::Updated => {
                    self.store.restart_scheduling_of_job(code).await
                        == ScheduleOutcome::Scheduled
                }
                ChangeKind::Deleted => self.store.stop_scheduling_of_job(code).await,
            }
        };

        session::release(session, code).await;
        changed
    }
}

#[async_trait]
impl NotificationHandler for CatalogReconciler {
    async fn on_notification(&self, notification: ChangeNotification) {
        if notification.resource_type != ResourceType::Job {
            debug!(
                "Ignoring notification for {:?} '{}'",
                notification.resource_type, notification.code
            );
            return;
        }
        if notification.code.is_empty() {
            warn!("Ignoring {} notification without a job code", notification.kind);
            return;
        }

        match notification.kind {
            ChangeKind::Created => self.on_created(&notification.code).await,
            ChangeKind::Updated => self.on_updated(&notification.code).await,
            ChangeKind::Deleted => self.on_deleted(&notification.code).await,
        };
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
