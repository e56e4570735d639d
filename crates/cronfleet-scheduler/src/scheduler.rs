//! Partitioned scheduler.
//!
//! One [`PartitionedScheduler`] per process owns the trigger engine, the
//! local schedule store, the reconciler and the dispatcher for this
//! instance. It has an explicit lifecycle: [`start`](PartitionedScheduler::start)
//! subscribes to catalog changes and bootstraps, and
//! [`shutdown`](PartitionedScheduler::shutdown) cancels every future firing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use cronfleet_protocols::{
    JobCatalog, MessageBus, NotificationFilter, OperationInstaller, OwnedJobIndex,
    PartitionDescriptor, ResourceType, SubscriptionId,
};

use crate::dispatcher::{DispatchStats, ExecutionDispatcher};
use crate::engine::{CronTriggerEngine, TriggerEngine};
use crate::error::SchedulerError;
use crate::partition::OwnershipResolver;
use crate::reconciler::{BootstrapReport, CatalogReconciler};
use crate::store::LocalScheduleStore;

/// Point-in-time view of a scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerStatus {
    pub instance_number: u32,
    pub total_instances: u32,
    pub group: String,
    pub scheduled: Vec<String>,
    pub stats: DispatchStats,
}

/// The scheduler of one fleet instance.
pub struct PartitionedScheduler {
    partition: PartitionDescriptor,
    store: Arc<LocalScheduleStore>,
    reconciler: Arc<CatalogReconciler>,
    dispatcher: Arc<ExecutionDispatcher>,
    started: AtomicBool,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl PartitionedScheduler {
    pub fn builder(partition: PartitionDescriptor) -> SchedulerBuilder {
        SchedulerBuilder::new(partition)
    }

    /// Subscribe to job notifications on `bus`, then bootstrap.
    ///
    /// Subscribing first means changes made while bootstrap runs are not
    /// lost; replaying them is harmless since every reaction is idempotent.
    /// A bootstrap failure is returned, but the subscription stays active.
    pub async fn start(&self, bus: &dyn MessageBus) -> Result<BootstrapReport, SchedulerError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(SchedulerError::AlreadyStarted);
        }
        info!("Starting scheduler instance {}", self.partition);

        bus.connect().await?;
        let id = bus
            .subscribe(
                NotificationFilter::resource(ResourceType::Job),
                self.reconciler.clone(),
            )
            .await?;
        *self.subscription.lock() = Some(id);

        let report = self.reconciler.bootstrap().await?;
        Ok(report)
    }

    /// Cancel every future firing. Firings already running complete.
    pub async fn shutdown(&self) {
        info!("Shutting down scheduler instance {}", self.partition);
        self.store.stop_scheduling_of_all_jobs().await;
    }

    pub async fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            instance_number: self.partition.instance_number(),
            total_instances: self.partition.total_instances(),
            group: self.store.group().to_string(),
            scheduled: self.store.scheduled_codes().await,
            stats: self.dispatcher.stats(),
        }
    }

    pub fn partition(&self) -> PartitionDescriptor {
        self.partition
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Subscription registered by [`start`](Self::start), if any.
    pub fn subscription(&self) -> Option<SubscriptionId> {
        *self.subscription.lock()
    }

    pub fn store(&self) -> &Arc<LocalScheduleStore> {
        &self.store
    }

    pub fn reconciler(&self) -> &Arc<CatalogReconciler> {
        &self.reconciler
    }

    pub fn resolver(&self) -> &OwnershipResolver {
        self.reconciler.resolver()
    }

    pub fn dispatcher(&self) -> &Arc<ExecutionDispatcher> {
        &self.dispatcher
    }
}

/// Builder for [`PartitionedScheduler`].
pub struct SchedulerBuilder {
    partition: PartitionDescriptor,
    catalog: Option<Arc<dyn JobCatalog>>,
    index: Option<Arc<dyn OwnedJobIndex>>,
    installer: Option<Arc<dyn OperationInstaller>>,
    engine: Option<Arc<dyn TriggerEngine>>,
}

impl SchedulerBuilder {
    pub fn new(partition: PartitionDescriptor) -> Self {
        Self {
            partition,
            catalog: None,
            index: None,
            installer: None,
            engine: None,
        }
    }

    /// Catalog used for per-job lookups.
    pub fn catalog(mut self, catalog: Arc<dyn JobCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Backing store queried once by bootstrap.
    pub fn index(mut self, index: Arc<dyn OwnedJobIndex>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn installer(mut self, installer: Arc<dyn OperationInstaller>) -> Self {
        self.installer = Some(installer);
        self
    }

    /// Trigger engine to register triggers with. Defaults to a private [`CronTriggerEngine`].
    pub fn engine(mut self, engine: Arc<dyn TriggerEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn build(self) -> Result<PartitionedScheduler, SchedulerError> {
        let catalog = self
            .catalog
            .ok_or(SchedulerError::MissingComponent("catalog"))?;
        let index = self.index.ok_or(SchedulerError::MissingComponent("index"))?;
        let installer = self
            .installer
            .ok_or(SchedulerError::MissingComponent("installer"))?;
        let engine = self
            .engine
            .unwrap_or_else(|| Arc::new(CronTriggerEngine::new()));

        let dispatcher = Arc::new(ExecutionDispatcher::new(catalog.clone(), installer));
        let store = Arc::new(LocalScheduleStore::new(
            self.partition,
            engine,
            catalog.clone(),
            dispatcher.clone(),
        ));
        let reconciler = Arc::new(CatalogReconciler::new(store.clone(), catalog, index));

        Ok(PartitionedScheduler {
            partition: self.partition,
            store,
            reconciler,
            dispatcher,
            started: AtomicBool::new(false),
            subscription: Mutex::new(None),
        })
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
