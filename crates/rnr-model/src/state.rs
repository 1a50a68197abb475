use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::TaskId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskResult {
    #[default]
    #[serde(rename = "RESULT_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "RESULT_SUCCESS")]
    Success,
    #[serde(rename = "RESULT_FAILURE")]
    Failure,
    #[serde(rename = "RESULT_CANCELLED")]
    Cancelled,
    #[serde(rename = "RESULT_SKIPPED")]
    Skipped,
}

impl TaskResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskResult::Unspecified => "unspecified",
            TaskResult::Success => "success",
            TaskResult::Failure => "failure",
            TaskResult::Cancelled => "cancelled",
            TaskResult::Skipped => "skipped",
        }
    }
}

/// Final state of a task, reported once its log stream is closed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskState {
    #[serde(with = "crate::wire::int64")]
    pub id: TaskId,
    pub result: TaskResult,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub stopped_at: Option<OffsetDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_uses_proto_enum_names() {
        let state = TaskState {
            id: 3,
            result: TaskResult::Cancelled,
            started_at: None,
            stopped_at: None,
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["id"], "3");
        assert_eq!(json["result"], "RESULT_CANCELLED");
        assert!(json["startedAt"].is_null());
    }
}
