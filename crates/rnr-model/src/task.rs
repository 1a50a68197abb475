use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{TaskId, TasksVersion};

/// Context field holding the target repository as `owner/name`.
pub const REPOSITORY_FIELD: &str = "repository";

/// Secret or variable that turns on `::debug::` output for a job.
pub const STEP_DEBUG_KEY: &str = "ACTIONS_STEP_DEBUG";

/// One unit of CI work handed out by the orchestrator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(with = "crate::wire::int64")]
    pub id: TaskId,
    /// Opaque workflow definition (base64 on the wire); never interpreted here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_payload: Option<String>,
    #[serde(default)]
    pub context: Map<String, Value>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub secrets: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub vars: HashMap<String, String>,
}

impl Task {
    /// String value of a context field, if present and a string.
    pub fn context_str(&self, key: &str) -> Option<&str> {
        self.context.get(key).and_then(Value::as_str)
    }

    /// Target repository; empty when the context does not carry one.
    pub fn repository(&self) -> &str {
        self.context_str(REPOSITORY_FIELD).unwrap_or_default()
    }

    /// Whether the job asked for `::debug::` lines to be shown.
    pub fn step_debug(&self) -> bool {
        let on = |v: &String| v.eq_ignore_ascii_case("true");
        self.secrets.get(STEP_DEBUG_KEY).is_some_and(on)
            || self.vars.get(STEP_DEBUG_KEY).is_some_and(on)
    }
}

/// Result of one fetch: the server's current version and maybe a task.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<Task>,
    #[serde(default, with = "crate::wire::int64")]
    pub tasks_version: TasksVersion,
}

impl FetchedTask {
    pub fn empty(tasks_version: TasksVersion) -> Self {
        Self {
            task: None,
            tasks_version,
        }
    }

    pub fn with_task(task: Task, tasks_version: TasksVersion) -> Self {
        Self {
            task: Some(task),
            tasks_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_fetch_response() {
        let body = r#"{
            "task": {
                "id": "12",
                "context": {"repository": "org/repo", "run_number": "3"},
                "secrets": {"TOKEN": "abc"}
            },
            "tasksVersion": "9"
        }"#;
        let fetched: FetchedTask = serde_json::from_str(body).unwrap();
        let task = fetched.task.expect("task present");
        assert_eq!(fetched.tasks_version, 9);
        assert_eq!(task.id, 12);
        assert_eq!(task.repository(), "org/repo");
        assert_eq!(task.secrets["TOKEN"], "abc");
    }

    #[test]
    fn empty_response_has_no_task() {
        let fetched: FetchedTask = serde_json::from_str("{}").unwrap();
        assert_eq!(fetched, FetchedTask::empty(0));
    }

    #[test]
    fn missing_or_non_string_repository_is_empty() {
        let mut task = Task::default();
        assert_eq!(task.repository(), "");
        task.context.insert(REPOSITORY_FIELD.into(), Value::from(5));
        assert_eq!(task.repository(), "");
    }

    #[test]
    fn step_debug_reads_secrets_and_vars() {
        let mut task = Task::default();
        assert!(!task.step_debug());
        task.vars.insert(STEP_DEBUG_KEY.into(), "TRUE".into());
        assert!(task.step_debug());
        task.vars.clear();
        task.secrets.insert(STEP_DEBUG_KEY.into(), "false".into());
        assert!(!task.step_debug());
    }
}
