//! Test utilities and fixtures for streampass integration tests

#![allow(dead_code)]

use std::time::Duration;

use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;

pub use streampass::db::{init_db, queries, AppState, DbPool};
pub use streampass::jwt::TokenSigner;
pub use streampass::models::*;
pub use streampass::reconcile::{
    reconcile, recover_unapplied_grants, PaymentNotification, ReconcileOutcome,
    DEFAULT_VALIDITY_DAYS,
};
pub use streampass::settings::SettingsCache;

pub const TEST_ADMIN_KEY: &str = "test-admin-key";

/// Create a deterministic test signer (fixed seed - ONLY for testing!)
pub fn test_signer() -> TokenSigner {
    TokenSigner::from_seed([42u8; 32]).expect("Failed to build test signer")
}

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create a single-connection in-memory pool with schema initialized.
/// max_size(1) because every pooled connection would otherwise get its own
/// private in-memory database.
pub fn setup_test_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .expect("Failed to create test pool");
    {
        let conn = pool.get().expect("Failed to get test connection");
        init_db(&conn).expect("Failed to initialize schema");
    }
    pool
}

/// Application state for tests: no gateway, no webhook secret, fixed admin key.
pub fn test_state(pool: DbPool) -> AppState {
    AppState {
        settings: SettingsCache::new(pool.clone(), Duration::from_secs(300)),
        db: pool,
        signer: test_signer(),
        gateway: None,
        webhook_secret: None,
        admin_api_key: Some(TEST_ADMIN_KEY.to_string()),
        base_url: "http://localhost:3000".to_string(),
    }
}

/// Build the full application router the way main() composes it.
pub fn test_app(state: AppState) -> Router {
    Router::new()
        .merge(streampass::handlers::public::router())
        .merge(streampass::handlers::webhooks::router())
        .merge(streampass::handlers::admin::router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create a test package
pub fn create_test_package(
    conn: &Connection,
    name: &str,
    price_cents: i64,
    validity_days: i64,
) -> Package {
    queries::upsert_package(
        conn,
        &UpsertPackage {
            name: name.to_string(),
            price_cents,
            validity_days,
        },
    )
    .expect("Failed to create test package")
}

/// Create a test user with no subscription
pub fn create_test_user(conn: &Connection, installation_id: &str) -> User {
    queries::create_user(
        conn,
        &CreateUser {
            installation_id: installation_id.to_string(),
            name: Some(format!("Test User {}", installation_id)),
            phone_number: None,
            subscription_expires_at: None,
        },
    )
    .expect("Failed to create test user")
}

/// Create a test user with an explicit phone number and expiry
pub fn create_test_user_full(
    conn: &Connection,
    installation_id: &str,
    phone_number: Option<&str>,
    subscription_expires_at: Option<i64>,
) -> User {
    queries::create_user(
        conn,
        &CreateUser {
            installation_id: installation_id.to_string(),
            name: Some(format!("Test User {}", installation_id)),
            phone_number: phone_number.map(String::from),
            subscription_expires_at,
        },
    )
    .expect("Failed to create test user")
}

/// Create a PENDING transaction
pub fn create_pending_transaction(
    conn: &Connection,
    order_id: &str,
    installation_id: &str,
    package_name: &str,
    phone_number: Option<&str>,
) -> Transaction {
    queries::create_transaction(
        conn,
        &CreateTransaction {
            order_id: order_id.to_string(),
            payer_name: "Test Payer".to_string(),
            phone_number: phone_number.map(String::from),
            package_name: package_name.to_string(),
            amount_cents: 9_900,
            installation_id: installation_id.to_string(),
        },
    )
    .expect("Failed to create test transaction")
}

/// Unix timestamp for 2024-01-01T00:00:00Z, used as a fixed "now" in tests.
pub const JAN_1_2024: i64 = 1_704_067_200;

pub const SECONDS_PER_DAY: i64 = 86400;
