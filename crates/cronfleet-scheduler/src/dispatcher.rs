//! Execution dispatcher.
//!
//! Runs whenever a trigger fires. The dispatcher never trusts the job
//! definition captured at schedule time: it re-reads the job by code and
//! submits whatever operation call the catalog holds right now.
//!
//! A failed submission is logged and dropped. It is not retried and it does
//! not unschedule the job, so one bad firing never removes future ones.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use cronfleet_protocols::{CatalogSession, JobCatalog, OperationInstaller};

use crate::session;

/// Data captured by a trigger at schedule time and consumed on each firing.
#[derive(Clone)]
pub struct ExecutionContext {
    dispatcher: Weak<ExecutionDispatcher>,
    job_code: String,
}

impl ExecutionContext {
    pub fn new(dispatcher: Weak<ExecutionDispatcher>, job_code: impl Into<String>) -> Self {
        Self {
            dispatcher,
            job_code: job_code.into(),
        }
    }

    pub fn job_code(&self) -> &str {
        &self.job_code
    }

    /// The dispatcher, if it is still alive.
    pub fn dispatcher(&self) -> Option<Arc<ExecutionDispatcher>> {
        self.dispatcher.upgrade()
    }
}

/// Result of a single firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The operation call was accepted.
    Dispatched,
    /// The execution context could not be resolved.
    MissingContext,
    /// The job no longer exists.
    JobNotFound,
    /// The catalog could not be read.
    CatalogUnavailable,
    /// The operation call failed.
    Failed,
}

/// Counters over every firing handled by a dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub fired: u64,
    pub dispatched: u64,
    pub failed: u64,
    pub skipped: u64,
}

/// Submits a job's operation call whenever its trigger fires.
pub struct ExecutionDispatcher {
    catalog: Arc<dyn JobCatalog>,
    installer: Arc<dyn OperationInstaller>,
    fired: AtomicU64,
    dispatched: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

impl ExecutionDispatcher {
    pub fn new(catalog: Arc<dyn JobCatalog>, installer: Arc<dyn OperationInstaller>) -> Self {
        Self {
            catalog,
            installer,
            fired: AtomicU64::new(0),
            dispatched: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        }
    }

    /// Entry point invoked by a trigger.
    pub async fn fire(context: ExecutionContext) -> DispatchOutcome {
        let dispatcher = match context.dispatcher() {
            Some(dispatcher) if !context.job_code().is_empty() => dispatcher,
            _ => {
                error!(
                    "Execution context for job '{}' cannot be resolved, abandoning firing",
                    context.job_code()
                );
                return DispatchOutcome::MissingContext;
            }
        };
        dispatcher.dispatch(context.job_code()).await
    }

    /// Re-read `code` and submit its operation call.
    pub async fn dispatch(&self, code: &str) -> DispatchOutcome {
        self.fired.fetch_add(1, Ordering::Relaxed);
        let firing_id = Uuid::new_v4();
        debug!("Job '{}' fired (firing {})", code, firing_id);

        let mut session = match self.catalog.begin_read().await {
            Ok(session) => session,
            Err(e) => {
                error!("Cannot read job '{}' for firing {}: {}", code, firing_id, e);
                self.skipped.fetch_add(1, Ordering::Relaxed);
                return DispatchOutcome::CatalogUnavailable;
            }
        };

        let outcome = self.submit(session.as_mut(), code, firing_id).await;
        session::release(session, code).await;
        outcome
    }

    async fn submit(
        &self,
        session: &mut dyn CatalogSession,
        code: &str,
        firing_id: Uuid,
    ) -> DispatchOutcome {
        let job = match session.find_by_code(code).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                warn!("Job '{}' no longer exists, skipping firing {}", code, firing_id);
                self.skipped.fetch_add(1, Ordering::Relaxed);
                return DispatchOutcome::JobNotFound;
            }
            Err(e) => {
                error!("Cannot read job '{}' for firing {}: {}", code, firing_id, e);
                self.skipped.fetch_add(1, Ordering::Relaxed);
                return DispatchOutcome::CatalogUnavailable;
            }
        };

        let call = &job.target_operation_call;
        match self.installer.execute(call).await {
            Ok(()) => {
                info!(
                    "Job '{}' dispatched operation '{}' (firing {})",
                    code, call.operation, firing_id
                );
                self.dispatched.fetch_add(1, Ordering::Relaxed);
                DispatchOutcome::Dispatched
            }
            Err(e) => {
                error!(
                    "Job '{}' failed to dispatch operation '{}' (firing {}): {}",
                    code, call.operation, firing_id, e
                );
                self.failed.fetch_add(1, Ordering::Relaxed);
                DispatchOutcome::Failed
            }
        }
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            fired: self.fired.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
