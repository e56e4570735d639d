//! HTTP request handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use cronfleet_protocols::ChangeNotification;
use cronfleet_scheduler::SchedulerStatus;

use crate::error::ApiError;
use crate::state::ApiState;

/// Response to an accepted notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationAccepted {
    pub status: String,
    /// Subscriptions the notification was handed to.
    pub delivered: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
}

/// Status response.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub scheduler: SchedulerStatus,
    pub notifications_received: u64,
    pub uptime_seconds: u64,
}

/// `POST /notifications`
pub async fn publish_notification(
    State(state): State<Arc<ApiState>>,
    Json(notification): Json<ChangeNotification>,
) -> Result<(StatusCode, Json<NotificationAccepted>), ApiError> {
    if notification.code.trim().is_empty() {
        return Err(ApiError::InvalidRequest(
            "notification code must not be empty".to_string(),
        ));
    }

    state.record_notification();
    debug!(
        "Received {} notification for {:?} '{}'",
        notification.kind, notification.resource_type, notification.code
    );

    let delivered = state.bus.publish(notification).map_err(|e| {
        warn!("Rejecting notification: {}", e);
        ApiError::from(e)
    })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(NotificationAccepted {
            status: "accepted".to_string(),
            delivered,
        }),
    ))
}

/// `GET /health`
pub async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_seconds: state.uptime().as_secs(),
    })
}

/// `GET /status`
pub async fn status(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        scheduler: state.scheduler.status().await,
        notifications_received: state.notifications_received(),
        uptime_seconds: state.uptime().as_secs(),
    })
}
