mod login;
mod pay;
mod status;

pub use login::*;
pub use pay::*;
pub use status::*;

use std::collections::HashMap;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::db::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Public read-only projection of the settings store: key → value only.
async fn public_settings(State(state): State<AppState>) -> Json<HashMap<String, String>> {
    Json(state.settings.snapshot())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/login", post(device_login))
        .route("/pay", post(initiate_payment))
        .route("/pay/{order_id}", get(payment_status))
        .route("/settings", get(public_settings))
}
