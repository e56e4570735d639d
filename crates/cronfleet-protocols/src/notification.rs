//! Change notification protocol definitions.
//!
//! The catalog publishes a notification whenever a resource is created,
//! updated or deleted. Delivery is at-least-once, unordered across codes
//! and not persisted: a restarted instance catches up through bootstrap,
//! not replay.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::BusError;

/// Kind of catalog resource a notification refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Job,
    Operation,
    #[serde(other)]
    Unknown,
}

/// What happened to the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Created => write!(f, "created"),
            ChangeKind::Updated => write!(f, "updated"),
            ChangeKind::Deleted => write!(f, "deleted"),
        }
    }
}

/// A catalog change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeNotification {
    pub resource_type: ResourceType,
    pub kind: ChangeKind,
    pub code: String,
}

impl ChangeNotification {
    pub fn new(resource_type: ResourceType, kind: ChangeKind, code: impl Into<String>) -> Self {
        Self {
            resource_type,
            kind,
            code: code.into(),
        }
    }

    /// Notification about a job.
    pub fn job(kind: ChangeKind, code: impl Into<String>) -> Self {
        Self::new(ResourceType::Job, kind, code)
    }
}

/// Subscription filter. Empty `kinds` matches every kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotificationFilter {
    pub resource_type: Option<ResourceType>,
    pub kinds: Vec<ChangeKind>,
}

impl NotificationFilter {
    /// Match every notification about the given resource type.
    pub fn resource(resource_type: ResourceType) -> Self {
        Self {
            resource_type: Some(resource_type),
            kinds: Vec::new(),
        }
    }

    /// Restrict to the given change kinds.
    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = ChangeKind>) -> Self {
        self.kinds = kinds.into_iter().collect();
        self
    }

    pub fn matches(&self, notification: &ChangeNotification) -> bool {
        if let Some(resource_type) = self.resource_type {
            if resource_type != notification.resource_type {
                return false;
            }
        }
        self.kinds.is_empty() || self.kinds.contains(&notification.kind)
    }
}

/// Identifier of an active subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receives notifications delivered by a [`MessageBus`].
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    async fn on_notification(&self, notification: ChangeNotification);
}

/// Publish/subscribe transport carrying catalog change notifications.
///
/// Implementations are chosen when the process is composed; the scheduler
/// only ever sees this trait.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Establish the connection to the transport.
    async fn connect(&self) -> Result<(), BusError>;

    /// Deliver notifications matching `filter` to `handler`, one at a time
    /// and in delivery order.
    async fn subscribe(
        &self,
        filter: NotificationFilter,
        handler: Arc<dyn NotificationHandler>,
    ) -> Result<SubscriptionId, BusError>;

    /// Stop every subscription and disconnect.
    async fn close(&self) -> Result<(), BusError>;
}
