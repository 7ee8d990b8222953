use serde::{Deserialize, Serialize};

/// A device installation and its subscription state.
///
/// The installation identifier is the sole identity key: payments are linked
/// to users through it and never through the phone number, which is an
/// auxiliary field (at most one user per number).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub installation_id: String,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    /// When premium access ends (None = never had a subscription).
    /// Premium is derived from this field, not stored separately.
    pub subscription_expires_at: Option<i64>,
    pub created_at: i64,
    pub last_seen_at: i64,
}

impl User {
    /// Whether the user has premium access at `now`.
    pub fn is_premium(&self, now: i64) -> bool {
        self.subscription_expires_at.is_some_and(|exp| exp > now)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub installation_id: String,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub subscription_expires_at: Option<i64>,
}

/// User as returned to clients, with the derived premium flag attached.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    #[serde(flatten)]
    pub user: User,
    pub premium: bool,
}

impl UserView {
    pub fn at(user: User, now: i64) -> Self {
        let premium = user.is_premium(now);
        Self { user, premium }
    }
}
