//! In-process message bus.
//!
//! Fans published notifications out to subscribers over a tokio broadcast
//! channel. Each subscription runs its own listener task that hands
//! notifications to its handler one at a time, so a handler always sees
//! notifications in publish order.
//!
//! Like any notification transport here, delivery is best effort and not
//! persisted: a subscriber that falls behind the channel capacity loses the
//! oldest notifications and relies on bootstrap to catch up.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use cronfleet_protocols::{
    BusError, ChangeNotification, MessageBus, NotificationFilter, NotificationHandler,
    SubscriptionId,
};

/// Default broadcast channel capacity.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Message bus living entirely inside the process.
pub struct LocalMessageBus {
    sender: broadcast::Sender<ChangeNotification>,
    connected: AtomicBool,
    closed: CancellationToken,
    subscriptions: Mutex<HashMap<SubscriptionId, JoinHandle<()>>>,
}

impl LocalMessageBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            connected: AtomicBool::new(false),
            closed: CancellationToken::new(),
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    /// Publish a notification. Returns the number of subscriptions reached.
    pub fn publish(&self, notification: ChangeNotification) -> Result<usize, BusError> {
        if self.closed.is_cancelled() {
            return Err(BusError::Closed);
        }
        if !self.is_connected() {
            return Err(BusError::NotConnected);
        }

        debug!(
            "Publishing {} notification for {:?} '{}'",
            notification.kind, notification.resource_type, notification.code
        );
        // No receivers is not an error: nobody was interested.
        Ok(self.sender.send(notification).unwrap_or(0))
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }
}

impl Default for LocalMessageBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl MessageBus for LocalMessageBus {
    async fn connect(&self) -> Result<(), BusError> {
        if self.closed.is_cancelled() {
            return Err(BusError::Closed);
        }
        self.connected.store(true, Ordering::SeqCst);
        debug!("Local message bus connected");
        Ok(())
    }

    async fn subscribe(
        &self,
        filter: NotificationFilter,
        handler: Arc<dyn NotificationHandler>,
    ) -> Result<SubscriptionId, BusError> {
        if self.closed.is_cancelled() {
            return Err(BusError::Closed);
        }
        if !self.is_connected() {
            return Err(BusError::NotConnected);
        }

        let id = SubscriptionId::new();
        let receiver = self.sender.subscribe();
        let handle = tokio::spawn(listen(id, receiver, filter, handler, self.closed.clone()));
        self.subscriptions.lock().insert(id, handle);

        debug!("Subscription {} registered", id);
        Ok(id)
    }

    async fn close(&self) -> Result<(), BusError> {
        self.closed.cancel();
        self.connected.store(false, Ordering::SeqCst);

        let handles: Vec<(SubscriptionId, JoinHandle<()>)> =
            self.subscriptions.lock().drain().collect();
        let count = handles.len();
        for (id, handle) in handles {
            if let Err(e) = handle.await {
                warn!("Subscription {} ended abnormally: {}", id, e);
            }
        }

        info!("Local message bus closed, {} subscriptions stopped", count);
        Ok(())
    }
}

/// Listener loop of one subscription.
async fn listen(
    id: SubscriptionId,
    mut receiver: broadcast::Receiver<ChangeNotification>,
    filter: NotificationFilter,
    handler: Arc<dyn NotificationHandler>,
    closed: CancellationToken,
) {
    loop {
        let notification = tokio::select! {
            biased;
            _ = closed.cancelled() => break,
            received = receiver.recv() => received,
        };

        match notification {
            Ok(notification) => {
                if filter.matches(&notification) {
                    handler.on_notification(notification).await;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Subscription {} lagged, {} notifications dropped", id, skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    debug!("Subscription {} stopped", id);
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
