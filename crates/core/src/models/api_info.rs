use serde::{Deserialize, Serialize};

/// Service metadata from `GET /api/info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<String>,
    pub last_updated: String,
}
