//! Operation call protocol definitions.
//!
//! An operation call is a remote procedure invocation against a previously
//! installed operation, carrying parameter values.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::OperationError;

/// Remote invocation of an installed operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationCall {
    /// Code of the installed operation.
    pub operation: String,

    /// Parameter values, keyed by parameter name.
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl OperationCall {
    /// Create a call without parameters.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            parameters: Map::new(),
        }
    }

    /// Add a parameter value.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

/// Executes operation calls on the remote operation installation service.
#[async_trait]
pub trait OperationInstaller: Send + Sync {
    /// Submit an operation call for execution.
    async fn execute(&self, call: &OperationCall) -> Result<(), OperationError>;
}
