//! # cronfleet API
//!
//! HTTP surface of a cronfleet instance:
//!
//! ```text
//! POST /notifications  - Publish a catalog change notification to the local bus
//! GET  /health         - Liveness check
//! GET  /status         - Partition, scheduled jobs and dispatch counters
//! ```
//!
//! The notification endpoint is the ingress of the in-process message bus:
//! the catalog (or anything relaying its events) posts changes here and the
//! local scheduler receives them through its bus subscription.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use server::{ApiConfig, ApiServer, ServerError};
pub use state::ApiState;
