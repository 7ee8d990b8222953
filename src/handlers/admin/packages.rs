use axum::extract::State;
use axum::http::StatusCode;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::models::{Package, UpsertPackage};

pub async fn list_packages(State(state): State<AppState>) -> Result<Json<Vec<Package>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_packages(&conn)?))
}

pub async fn upsert_package(
    State(state): State<AppState>,
    Json(input): Json<UpsertPackage>,
) -> Result<Json<Package>> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("Missing package name".into()));
    }
    if input.validity_days <= 0 {
        return Err(AppError::BadRequest("Validity must be positive".into()));
    }
    if input.price_cents < 0 {
        return Err(AppError::BadRequest("Price must not be negative".into()));
    }

    let conn = state.db.get()?;
    Ok(Json(queries::upsert_package(&conn, &input)?))
}

pub async fn delete_package(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode> {
    let conn = state.db.get()?;
    if !queries::delete_package(&conn, &name)? {
        return Err(AppError::NotFound("Package not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
