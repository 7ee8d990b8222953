//! Public endpoints: payment initiation, status polling, device login.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use common::*;

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body is JSON")
}

// ============ Initiation ============

#[tokio::test]
async fn test_initiation_creates_pending_transaction() {
    let pool = setup_test_pool();
    {
        let conn = pool.get().unwrap();
        create_test_package(&conn, "Wiki 1", 9_900, 7);
    }
    let app = test_app(test_state(pool.clone()));

    let response = app
        .oneshot(post_json(
            "/pay",
            r#"{"name":"Asha","phoneNumber":"+15550001","package":"Wiki 1","installationId":"install-1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let order_id = body["orderId"].as_str().expect("orderId present");
    assert_eq!(body["amountCents"], 9_900);

    // No gateway configured in tests: the transaction stays PENDING.
    let conn = pool.get().unwrap();
    let tx = queries::get_transaction(&conn, order_id).unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::Pending);
    assert_eq!(tx.package_name, "Wiki 1");
    assert_eq!(tx.installation_id, "install-1");
    assert_eq!(tx.amount_cents, 9_900);
}

#[tokio::test]
async fn test_initiation_rejects_unknown_package() {
    let pool = setup_test_pool();
    let app = test_app(test_state(pool));

    let response = app
        .oneshot(post_json(
            "/pay",
            r#"{"name":"Asha","package":"No Such Plan","installationId":"install-1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_initiation_rejects_missing_installation_id() {
    let pool = setup_test_pool();
    {
        let conn = pool.get().unwrap();
        create_test_package(&conn, "Wiki 1", 9_900, 7);
    }
    let app = test_app(test_state(pool));

    let response = app
        .oneshot(post_json(
            "/pay",
            r#"{"name":"Asha","package":"Wiki 1","installationId":"  "}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============ Status polling ============

#[tokio::test]
async fn test_status_unknown_order_is_404() {
    let pool = setup_test_pool();
    let app = test_app(test_state(pool));

    let response = app.oneshot(get("/pay/no-such-order")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_pending_has_no_token_or_user() {
    let pool = setup_test_pool();
    {
        let conn = pool.get().unwrap();
        create_test_package(&conn, "Wiki 1", 9_900, 7);
        create_pending_transaction(&conn, "order-1", "install-1", "Wiki 1", None);
    }
    let app = test_app(test_state(pool));

    let response = app.oneshot(get("/pay/order-1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "PENDING");
    assert!(body.get("token").is_none());
    assert!(body.get("user").is_none());
}

#[tokio::test]
async fn test_status_completed_returns_token_and_user() {
    let pool = setup_test_pool();
    let state = test_state(pool.clone());
    {
        let conn = pool.get().unwrap();
        create_test_package(&conn, "Wiki 1", 9_900, 7);
        create_pending_transaction(&conn, "order-1", "install-1", "Wiki 1", None);
        // Settle through the engine so polling reflects what it wrote.
        reconcile(
            &conn,
            &state.signer,
            &PaymentNotification {
                order_id: "order-1".to_string(),
                payment_status: TransactionStatus::Completed,
            },
            JAN_1_2024,
        )
        .unwrap();
    }
    let app = test_app(state);

    let response = app.oneshot(get("/pay/order-1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "COMPLETED");
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["installation_id"], "install-1");
    assert_eq!(body["user"]["premium"], true);
}

// ============ Device login ============

#[tokio::test]
async fn test_login_creates_user_on_first_seen() {
    let pool = setup_test_pool();
    let app = test_app(test_state(pool.clone()));

    let response = app
        .oneshot(post_json(
            "/login",
            r#"{"installationId":"install-1","name":"Asha","phoneNumber":"+15550001"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["installation_id"], "install-1");
    assert_eq!(body["premium"], false);

    let conn = pool.get().unwrap();
    let user = queries::get_user_by_installation(&conn, "install-1")
        .unwrap()
        .unwrap();
    assert_eq!(user.phone_number.as_deref(), Some("+15550001"));
}

#[tokio::test]
async fn test_login_does_not_steal_claimed_phone() {
    let pool = setup_test_pool();
    {
        let conn = pool.get().unwrap();
        create_test_user_full(&conn, "install-owner", Some("+15550001"), None);
    }
    let app = test_app(test_state(pool.clone()));

    let response = app
        .oneshot(post_json(
            "/login",
            r#"{"installationId":"install-2","phoneNumber":"+15550001"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let conn = pool.get().unwrap();
    let user = queries::get_user_by_installation(&conn, "install-2")
        .unwrap()
        .unwrap();
    assert_eq!(user.phone_number, None);
    let owner = queries::get_user_by_phone(&conn, "+15550001").unwrap().unwrap();
    assert_eq!(owner.installation_id, "install-owner");
}

#[tokio::test]
async fn test_login_reports_premium_after_grant() {
    let pool = setup_test_pool();
    {
        let conn = pool.get().unwrap();
        // Expiry far in the future.
        create_test_user_full(&conn, "install-1", None, Some(4_000_000_000));
    }
    let app = test_app(test_state(pool));

    let response = app
        .oneshot(post_json("/login", r#"{"installationId":"install-1"}"#))
        .await
        .unwrap();

    let body = json_body(response).await;
    assert_eq!(body["premium"], true);
}

#[tokio::test]
async fn test_health() {
    let pool = setup_test_pool();
    let app = test_app(test_state(pool));

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}
