use serde::{Deserialize, Serialize};

/// A subscription plan. The name is the identity and is matched
/// case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub price_cents: i64,
    pub validity_days: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertPackage {
    pub name: String,
    pub price_cents: i64,
    pub validity_days: i64,
}
