use serde::{Deserialize, Serialize};

/// One payment attempt, keyed by its order identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub order_id: String,
    pub payer_name: String,
    pub phone_number: Option<String>,
    /// Free-text package name, matched case-insensitively against the catalog.
    pub package_name: String,
    pub amount_cents: i64,
    pub status: TransactionStatus,
    /// Installation identifier of the initiating user.
    pub installation_id: String,
    /// Access token issued on completion (None until then).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Expiry granted to the user when this transaction completed.
    /// Recorded before the user write so an interrupted grant can be
    /// re-applied by the recovery scan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granted_expires_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransaction {
    pub order_id: String,
    pub payer_name: String,
    pub phone_number: Option<String>,
    pub package_name: String,
    pub amount_cents: i64,
    pub installation_id: String,
}

/// Payment attempt status. PENDING is the only non-terminal state;
/// transitions are monotonic and terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
    Expired,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            "EXPIRED" => Ok(Self::Expired),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
