//! Request and response bodies of the runner service, in proto3 JSON form.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use rnr_model::{LogRow, Task, TaskId, TaskState, TasksVersion};

pub const SERVICE_PATH: &str = "api/actions/runner.v1.RunnerService";

#[derive(Debug, Clone, Default, Serialize)]
pub struct DeclareRequest {
    pub version: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeclareResponse {
    #[serde(default)]
    pub runner: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchTaskRequest {
    #[serde(with = "rnr_model::wire::int64")]
    pub tasks_version: TasksVersion,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchTaskResponse {
    #[serde(default)]
    pub task: Option<Task>,
    #[serde(default, with = "rnr_model::wire::int64")]
    pub tasks_version: TasksVersion,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLogRequest {
    #[serde(with = "rnr_model::wire::int64")]
    pub task_id: TaskId,
    #[serde(with = "rnr_model::wire::int64")]
    pub index: i64,
    pub rows: Vec<LogRow>,
    pub no_more: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLogResponse {
    #[serde(default, with = "rnr_model::wire::int64")]
    pub ack_index: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateTaskRequest {
    pub state: TaskState,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub outputs: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskResponse {
    #[serde(default)]
    pub state: Option<serde_json::Value>,
}

/// Connect error body sent with non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rnr_model::TaskResult;

    #[test]
    fn fetch_request_sends_version_as_string() {
        let json = serde_json::to_value(FetchTaskRequest { tasks_version: 12 }).unwrap();
        assert_eq!(json, serde_json::json!({ "tasksVersion": "12" }));
    }

    #[test]
    fn fetch_response_without_task() {
        let resp: FetchTaskResponse = serde_json::from_str(r#"{"tasksVersion":"4"}"#).unwrap();
        assert!(resp.task.is_none());
        assert_eq!(resp.tasks_version, 4);

        let empty: FetchTaskResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.tasks_version, 0);
    }

    #[test]
    fn fetch_response_with_task() {
        let body = r#"{
            "task": {
                "id": "31",
                "context": { "repository": "org/app" },
                "secrets": { "TOKEN": "abc" }
            },
            "tasksVersion": "9"
        }"#;
        let resp: FetchTaskResponse = serde_json::from_str(body).unwrap();
        let task = resp.task.unwrap();
        assert_eq!(task.id, 31);
        assert_eq!(task.repository(), "org/app");
        assert_eq!(task.secrets["TOKEN"], "abc");
    }

    #[test]
    fn update_log_request_shape() {
        let req = UpdateLogRequest {
            task_id: 3,
            index: 10,
            rows: vec![],
            no_more: true,
        };
        let json = serde_json::to_value(req).unwrap();
        assert_eq!(json["taskId"], "3");
        assert_eq!(json["index"], "10");
        assert_eq!(json["noMore"], true);
    }

    #[test]
    fn update_task_request_omits_empty_outputs() {
        let req = UpdateTaskRequest {
            state: TaskState {
                id: 1,
                result: TaskResult::Success,
                started_at: None,
                stopped_at: None,
            },
            outputs: HashMap::new(),
        };
        let json = serde_json::to_value(req).unwrap();
        assert_eq!(json["state"]["result"], "RESULT_SUCCESS");
        assert!(json.get("outputs").is_none());
    }

    #[test]
    fn error_body_tolerates_missing_fields() {
        let body: ErrorBody = serde_json::from_str(r#"{"code":"unimplemented"}"#).unwrap();
        assert_eq!(body.code, "unimplemented");
        assert!(body.message.is_empty());
    }
}
