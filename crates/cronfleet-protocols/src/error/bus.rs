//! Message bus errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("Message bus is not connected")]
    NotConnected,

    #[error("Message bus is closed")]
    Closed,

    #[error("Transport error: {0}")]
    Transport(String),
}
