//! Operation installation errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("Operation '{operation}' rejected ({status}): {message}")]
    Rejected {
        operation: String,
        status: u16,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Operation call timed out")]
    Timeout,
}
