use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One sanitized line of job output, as uploaded to the orchestrator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRow {
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    pub content: String,
}

impl LogRow {
    pub fn now(content: impl Into<String>) -> Self {
        Self {
            time: OffsetDateTime::now_utc(),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn time_is_rfc3339() {
        let row = LogRow {
            time: datetime!(2024-01-02 03:04:05 UTC),
            content: "hello".into(),
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"time":"2024-01-02T03:04:05Z","content":"hello"}"#);
    }
}
