//! Inbound payment-gateway webhook.
//!
//! The gateway retries on anything but 200, so every "nothing to do" case
//! (unknown order, already settled) still answers 200. Only malformed input
//! is rejected with 4xx, before any store access; 500 is reserved for
//! genuine internal failures.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;

use crate::db::AppState;
use crate::payments::verify_webhook_signature;
use crate::reconcile::{reconcile, PaymentNotification, ReconcileOutcome};

const SIGNATURE_HEADER: &str = "x-gateway-signature";

pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    // Signature check only when a secret is configured.
    if let Some(ref secret) = state.webhook_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !verify_webhook_signature(secret, &body, signature) {
            tracing::warn!("Webhook rejected: bad or missing signature");
            return (StatusCode::UNAUTHORIZED, "Invalid signature");
        }
    }

    let notification: PaymentNotification = match serde_json::from_slice(&body) {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!("Webhook rejected: malformed body: {}", e);
            return (StatusCode::BAD_REQUEST, "Malformed webhook body");
        }
    };

    let conn = match state.db.get() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Webhook: no DB connection: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    let now = Utc::now().timestamp();
    match reconcile(&conn, &state.signer, &notification, now) {
        Ok(ReconcileOutcome::UnknownOrder) => (StatusCode::OK, "Unknown order, ignored"),
        Ok(ReconcileOutcome::AlreadySettled { .. }) => (StatusCode::OK, "Already settled"),
        Ok(ReconcileOutcome::MarkedTerminal { .. }) => (StatusCode::OK, "Status recorded"),
        Ok(ReconcileOutcome::Granted { .. }) => (StatusCode::OK, "Subscription granted"),
        Err(crate::error::AppError::BadRequest(msg)) => {
            tracing::warn!("Webhook rejected: {}", msg);
            (StatusCode::BAD_REQUEST, "Invalid webhook")
        }
        Err(e) => {
            tracing::error!("Webhook processing failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}
