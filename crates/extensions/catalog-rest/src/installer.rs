//! REST operation installer client.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use cronfleet_protocols::{OperationCall, OperationError, OperationInstaller};

use crate::endpoint::Endpoint;

/// Submits operation calls to `POST {base}/operations/{operation}/execute`.
///
/// The request body is the call's parameter map. Any non-2xx answer is a
/// rejection; the call is never retried here.
pub struct RestOperationInstaller {
    endpoint: Endpoint,
}

impl RestOperationInstaller {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, OperationError> {
        let endpoint = Endpoint::new(base_url, timeout).map_err(OperationError::Transport)?;
        Ok(Self { endpoint })
    }

    pub fn base_url(&self) -> &str {
        self.endpoint.base().as_str()
    }
}

#[async_trait]
impl OperationInstaller for RestOperationInstaller {
    async fn execute(&self, call: &OperationCall) -> Result<(), OperationError> {
        let url = self
            .endpoint
            .url(&["operations", &call.operation, "execute"]);
        debug!("POST {}", url);

        let response = self
            .endpoint
            .client()
            .post(url)
            .json(&call.parameters)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OperationError::Timeout
                } else {
                    OperationError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(OperationError::Rejected {
                operation: call.operation.clone(),
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "installer_tests.rs"]
mod tests;
