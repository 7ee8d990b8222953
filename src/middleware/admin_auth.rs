use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::db::AppState;

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Guard for admin routes: a single static bearer key, compared in constant
/// time. With no key configured the admin API is disabled outright.
pub async fn admin_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(ref expected) = state.admin_api_key else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let token = extract_bearer_token(&headers).ok_or(StatusCode::UNAUTHORIZED)?;

    let valid: bool = token.as_bytes().ct_eq(expected.as_bytes()).into();
    if !valid {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}
