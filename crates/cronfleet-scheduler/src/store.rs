//! Local schedule store.
//!
//! Owns this instance's triggers inside a trigger engine. Triggers live in
//! a group derived from the instance number, so several instances sharing
//! one engine never collide, and each trigger is named after its job code.
//!
//! Every mutation, and every membership query, holds one instance-wide
//! lock. That makes `restart` a single atomic unit with respect to
//! concurrent reconciliation. Firings never take the lock.
//!
//! None of the operations return errors: failures are logged and the job is
//! left unscheduled, so one broken job never takes the instance down.

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use cronfleet_protocols::{JobCatalog, PartitionDescriptor};

use crate::dispatcher::{ExecutionContext, ExecutionDispatcher};
use crate::engine::{FireTask, TriggerEngine, TriggerKey};
use crate::error::EngineError;
use crate::session;

/// Trigger group used by the given instance.
pub fn trigger_group(partition: PartitionDescriptor) -> String {
    format!("cronfleet-instance-{}", partition.instance_number())
}

/// Result of an attempt to schedule a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Scheduled,
    /// No job with that code exists; nothing was done.
    JobNotFound,
    /// The expression has no future fire time.
    NeverFires,
    /// The engine refused the trigger (malformed expression, duplicate, shut down).
    Rejected,
    /// The job could not be read from the catalog.
    CatalogUnavailable,
}

/// Per-instance set of scheduled jobs.
pub struct LocalScheduleStore {
    partition: PartitionDescriptor,
    group: String,
    engine: Arc<dyn TriggerEngine>,
    catalog: Arc<dyn JobCatalog>,
    dispatcher: Arc<ExecutionDispatcher>,
    lock: Mutex<()>,
}

impl LocalScheduleStore {
    pub fn new(
        partition: PartitionDescriptor,
        engine: Arc<dyn TriggerEngine>,
        catalog: Arc<dyn JobCatalog>,
        dispatcher: Arc<ExecutionDispatcher>,
    ) -> Self {
        Self {
            partition,
            group: trigger_group(partition),
            engine,
            catalog,
            dispatcher,
            lock: Mutex::new(()),
        }
    }

    pub fn partition(&self) -> PartitionDescriptor {
        self.partition
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    /// Whether a trigger for `code` is registered on this instance.
    pub async fn schedules_job(&self, code: &str) -> bool {
        let _guard = self.lock.lock().await;
        self.is_registered(code)
    }

    /// Codes of every job scheduled on this instance, sorted.
    pub async fn scheduled_codes(&self) -> Vec<String> {
        let _guard = self.lock.lock().await;
        self.engine.job_names(&self.group)
    }

    /// Look the job up and register its trigger.
    pub async fn start_scheduling_of_job(&self, code: &str) -> ScheduleOutcome {
        let _guard = self.lock.lock().await;
        self.start_locked(code).await
    }

    /// Remove the trigger for `code`. Returns `false` if it was not scheduled.
    pub async fn stop_scheduling_of_job(&self, code: &str) -> bool {
        let _guard = self.lock.lock().await;
        self.stop_locked(code)
    }

    /// Replace the trigger for `code` with one built from the current definition.
    pub async fn restart_scheduling_of_job(&self, code: &str) -> ScheduleOutcome {
        let _guard = self.lock.lock().await;
        self.stop_locked(code);
        self.start_locked(code).await
    }

    /// Cancel every trigger of this instance and refuse later starts.
    /// Only meant for process teardown; other groups on a shared engine keep running.
    pub async fn stop_scheduling_of_all_jobs(&self) {
        let _guard = self.lock.lock().await;
        info!("Stopping all scheduled jobs of instance {}", self.partition);
        self.engine.shutdown_group(&self.group);
    }

    fn is_registered(&self, code: &str) -> bool {
        self.engine.job_names(&self.group).iter().any(|name| name == code)
    }

    async fn start_locked(&self, code: &str) -> ScheduleOutcome {
        let job = match session::fetch_job(self.catalog.as_ref(), code).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                debug!("Job '{}' not found in catalog, nothing to schedule", code);
                return ScheduleOutcome::JobNotFound;
            }
            Err(e) => {
                error!("Failed to load job '{}' for scheduling: {}", code, e);
                return ScheduleOutcome::CatalogUnavailable;
            }
        };

        let context = ExecutionContext::new(Arc::downgrade(&self.dispatcher), code);
        let task: FireTask = Arc::new(move || {
            let context = context.clone();
            async move {
                ExecutionDispatcher::fire(context).await;
            }
            .boxed()
        });

        let key = TriggerKey::new(self.group.clone(), code);
        match self.engine.schedule(key, &job.schedule_expression, task) {
            Ok(handle) => {
                info!(
                    "Scheduled job '{}' with '{}', next fire at {}",
                    code,
                    handle.expression,
                    handle.next_fire_time.to_rfc3339()
                );
                ScheduleOutcome::Scheduled
            }
            Err(EngineError::NeverFires(expression)) => {
                warn!(
                    "Job '{}' will never fire with '{}', leaving it unscheduled",
                    code, expression
                );
                ScheduleOutcome::NeverFires
            }
            Err(e) => {
                error!("Failed to schedule job '{}': {}", code, e);
                ScheduleOutcome::Rejected
            }
        }
    }

    fn stop_locked(&self, code: &str) -> bool {
        let removed = self.engine.unschedule(&TriggerKey::new(self.group.clone(), code));
        if removed {
            info!("Unscheduled job '{}'", code);
        } else {
            debug!("Job '{}' was not scheduled on this instance", code);
        }
        removed
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
