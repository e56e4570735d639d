//! Application state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use cronfleet_scheduler::{LocalMessageBus, PartitionedScheduler};

/// State shared across handlers.
pub struct ApiState {
    pub bus: Arc<LocalMessageBus>,
    pub scheduler: Arc<PartitionedScheduler>,
    start_time: Instant,
    notifications_received: AtomicU64,
}

impl ApiState {
    pub fn new(bus: Arc<LocalMessageBus>, scheduler: Arc<PartitionedScheduler>) -> Self {
        Self {
            bus,
            scheduler,
            start_time: Instant::now(),
            notifications_received: AtomicU64::new(0),
        }
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    pub fn notifications_received(&self) -> u64 {
        self.notifications_received.load(Ordering::Relaxed)
    }

    pub(crate) fn record_notification(&self) {
        self.notifications_received.fetch_add(1, Ordering::Relaxed);
    }
}
