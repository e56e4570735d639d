//! Job definition as exposed by the job catalog.

use serde::{Deserialize, Serialize};

use crate::operation::OperationCall;

/// A catalog job: a cron schedule paired with a remote operation call.
///
/// The catalog owns jobs; schedulers only ever hold transient copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Persisted numeric ID. `0` until the job is first persisted.
    #[serde(default)]
    pub id: u64,

    /// Unique job code.
    pub code: String,

    /// Cron expression driving the job.
    pub schedule_expression: String,

    /// Operation call submitted on each firing.
    pub target_operation_call: OperationCall,
}

impl Job {
    /// Create a new, not yet persisted job.
    pub fn new(
        code: impl Into<String>,
        schedule_expression: impl Into<String>,
        target_operation_call: OperationCall,
    ) -> Self {
        Self {
            id: 0,
            code: code.into(),
            schedule_expression: schedule_expression.into(),
            target_operation_call,
        }
    }

    /// Set the persisted ID.
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// Whether the catalog has assigned an ID to this job.
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_job_is_not_persisted() {
        let job = Job::new("nightly", "0 0 0 * * *", OperationCall::new("cleanup"));
        assert_eq!(job.id, 0);
        assert!(!job.is_persisted());
    }

    #[test]
    fn test_with_id_marks_persisted() {
        let job = Job::new("nightly", "0 0 0 * * *", OperationCall::new("cleanup")).with_id(42);
        assert!(job.is_persisted());
        assert_eq!(job.id, 42);
    }

    #[test]
    fn test_deserialize_without_id() {
        let job: Job = serde_json::from_value(json!({
            "code": "J1",
            "scheduleExpression": "0 */5 * * * *",
            "targetOperationCall": {"operation": "sync", "parameters": {"full": true}}
        }))
        .unwrap();

        assert_eq!(job.id, 0);
        assert_eq!(job.code, "J1");
        assert_eq!(job.target_operation_call.operation, "sync");
        assert_eq!(job.target_operation_call.parameters["full"], json!(true));
    }

    #[test]
    fn test_serialize_uses_camel_case() {
        let job = Job::new("J2", "0 0 * * * *", OperationCall::new("ping")).with_id(3);
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["scheduleExpression"], "0 0 * * * *");
        assert_eq!(value["targetOperationCall"]["operation"], "ping");
        assert_eq!(value["id"], 3);
    }
}
