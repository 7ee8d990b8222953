use axum::extract::State;
use axum::http::StatusCode;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::models::{Setting, UpsertSetting};

pub async fn list_settings(State(state): State<AppState>) -> Result<Json<Vec<Setting>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_settings(&conn)?))
}

/// Upsert a setting: write through to the store, then update the cached
/// snapshot so readers see the new value without waiting for the TTL.
pub async fn upsert_setting(
    State(state): State<AppState>,
    Json(input): Json<UpsertSetting>,
) -> Result<Json<Setting>> {
    if input.key.trim().is_empty() {
        return Err(AppError::BadRequest("Missing setting key".into()));
    }

    let conn = state.db.get()?;
    let setting = queries::upsert_setting(&conn, &input)?;
    state.settings.set(&setting.key, &setting.value);
    Ok(Json(setting))
}

pub async fn delete_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode> {
    let conn = state.db.get()?;
    if !queries::delete_setting(&conn, &key)? {
        return Err(AppError::NotFound("Setting not found".into()));
    }
    state.settings.delete(&key);
    Ok(StatusCode::NO_CONTENT)
}
