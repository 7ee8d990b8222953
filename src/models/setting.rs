use serde::{Deserialize, Serialize};

/// Key/value configuration entry, served through the settings cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertSetting {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
}
