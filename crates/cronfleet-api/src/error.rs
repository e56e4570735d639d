//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use cronfleet_protocols::BusError;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The notification could not be handed to the bus.
    #[error("Notification bus unavailable: {0}")]
    BusUnavailable(#[from] BusError),

    /// The request was well-formed JSON but semantically invalid.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BusUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
