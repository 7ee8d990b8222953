use axum::extract::State;
use chrono::Utc;
use serde::Serialize;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::models::{TransactionStatus, UserView};

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: TransactionStatus,
    /// Present only once the order is COMPLETED.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
}

/// Poll a payment attempt. Reflects exactly what the reconciliation engine
/// last wrote; for COMPLETED orders the issued token and the resolved user
/// ride along.
pub async fn payment_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<StatusResponse>> {
    let conn = state.db.get()?;

    let tx = queries::get_transaction(&conn, &order_id)?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    if tx.status != TransactionStatus::Completed {
        return Ok(Json(StatusResponse {
            status: tx.status,
            token: None,
            user: None,
        }));
    }

    let user = queries::get_user_by_installation(&conn, &tx.installation_id)?
        .map(|u| UserView::at(u, Utc::now().timestamp()));

    Ok(Json(StatusResponse {
        status: tx.status,
        token: tx.access_token,
        user,
    }))
}
