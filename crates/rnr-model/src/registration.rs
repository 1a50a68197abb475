use serde::{Deserialize, Serialize};

/// Contents of the registration file written when the runner was registered.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    #[serde(rename = "WARNING", default, skip_serializing_if = "String::is_empty")]
    pub warning: String,
    #[serde(default)]
    pub id: i64,
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    pub token: String,
    pub address: String,
    #[serde(default)]
    pub labels: Vec<String>,
}
