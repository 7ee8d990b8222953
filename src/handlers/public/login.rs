use axum::extract::State;
use chrono::Utc;
use serde::Deserialize;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::models::{CreateUser, UserView};
use crate::reconcile::adopt_phone_number;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub installation_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// Device login: upsert the user by installation identifier, bump last-seen,
/// and return the current subscription state. Phone adoption follows the
/// same collision rule as reconciliation.
pub async fn device_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<UserView>> {
    if request.installation_id.trim().is_empty() {
        return Err(AppError::BadRequest("Missing installation identifier".into()));
    }

    let conn = state.db.get()?;
    let now = Utc::now().timestamp();

    let user = match queries::get_user_by_installation(&conn, &request.installation_id)? {
        Some(user) => {
            queries::touch_user_login(&conn, &user.id, request.name.as_deref())?;
            let user = adopt_phone_number(&conn, user, request.phone_number.as_deref())?;
            crate::models::User {
                name: request.name.clone().or(user.name.clone()),
                last_seen_at: now,
                ..user
            }
        }
        None => {
            // First login wins the phone number only if nobody owns it yet.
            let phone = match request.phone_number.as_deref().filter(|p| !p.is_empty()) {
                Some(p) => match queries::get_user_by_phone(&conn, p)? {
                    Some(_) => None,
                    None => Some(p.to_string()),
                },
                None => None,
            };
            queries::create_user(
                &conn,
                &CreateUser {
                    installation_id: request.installation_id.clone(),
                    name: request.name.clone(),
                    phone_number: phone,
                    subscription_expires_at: None,
                },
            )?
        }
    };

    Ok(Json(UserView::at(user, now)))
}
