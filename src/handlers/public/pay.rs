use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::models::{CreateTransaction, TransactionStatus};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    pub name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Package name, matched case-insensitively against the catalog.
    pub package: String,
    pub installation_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayResponse {
    pub order_id: String,
    pub amount_cents: i64,
}

/// Initiate a payment: create a PENDING transaction keyed by a fresh order
/// id and respond immediately. The gateway call runs after the response in a
/// spawned task; on any failure it marks the transaction FAILED directly
/// without waiting for a webhook.
pub async fn initiate_payment(
    State(state): State<AppState>,
    Json(request): Json<PayRequest>,
) -> Result<Json<PayResponse>> {
    if request.name.trim().is_empty() {
        return Err(AppError::BadRequest("Missing payer name".into()));
    }
    if request.installation_id.trim().is_empty() {
        return Err(AppError::BadRequest("Missing installation identifier".into()));
    }

    let conn = state.db.get()?;

    // Initiation requires a real catalog entry; the 30-day fallback only
    // applies at reconciliation time.
    let package = queries::get_package_by_name(&conn, &request.package)?
        .ok_or_else(|| AppError::NotFound("Package not found".into()))?;

    let order_id = queries::generate_order_id();
    let tx = queries::create_transaction(
        &conn,
        &CreateTransaction {
            order_id: order_id.clone(),
            payer_name: request.name.trim().to_string(),
            phone_number: request.phone_number.clone().filter(|p| !p.is_empty()),
            package_name: package.name.clone(),
            amount_cents: package.price_cents,
            installation_id: request.installation_id.clone(),
        },
    )?;

    if let Some(gateway) = state.gateway.clone() {
        let callback_url = format!("{}/webhook/payment", state.base_url);
        let db = state.db.clone();
        tokio::spawn(async move {
            let result = gateway
                .create_payment(
                    &tx.order_id,
                    tx.amount_cents,
                    &tx.payer_name,
                    tx.phone_number.as_deref(),
                    &callback_url,
                )
                .await;

            if let Err(e) = result {
                tracing::warn!("Gateway call for order {} failed: {}", tx.order_id, e);
                match db.get() {
                    Ok(conn) => {
                        if let Err(e) = queries::mark_transaction_status(
                            &conn,
                            &tx.order_id,
                            TransactionStatus::Failed,
                        ) {
                            tracing::error!(
                                "Failed to mark order {} FAILED: {}",
                                tx.order_id,
                                e
                            );
                        }
                    }
                    Err(e) => {
                        tracing::error!(
                            "No DB connection to mark order {} FAILED: {}",
                            tx.order_id,
                            e
                        );
                    }
                }
            }
        });
    } else {
        tracing::debug!(
            "No gateway configured, order {} stays PENDING",
            order_id
        );
    }

    Ok(Json(PayResponse {
        order_id,
        amount_cents: package.price_cents,
    }))
}
