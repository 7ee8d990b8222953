use serde::{Deserialize, Serialize};

/// Custom claims carried by access tokens. Standard claims (iss, sub, iat,
/// exp) are handled by jwt-simple; `sub` carries the installation identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// When the granted subscription ends (unix seconds).
    pub premium_until: i64,
    /// Catalog package the grant came from, as recorded on the transaction.
    pub package: String,
}
