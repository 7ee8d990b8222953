use std::time::Duration;

use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use streampass::config::Config;
use streampass::db::{create_pool, init_db, queries, AppState};
use streampass::handlers;
use streampass::jwt::TokenSigner;
use streampass::models::{UpsertPackage, UpsertSetting};
use streampass::payments::GatewayClient;
use streampass::reconcile;
use streampass::settings::SettingsCache;

#[derive(Parser, Debug)]
#[command(name = "streampass")]
#[command(about = "Subscription and payment reconciliation backend for a streaming app")]
struct Cli {
    /// Seed the database with dev data (packages and settings)
    #[arg(long)]
    seed: bool,
}

/// Seeds the catalog and settings with dev data. Only runs when the
/// packages table is empty.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let existing = queries::list_packages(&conn).expect("Failed to list packages");
    if !existing.is_empty() {
        tracing::info!("Packages already exist, skipping seed");
        return;
    }

    tracing::info!("Seeding dev packages and settings");

    for (name, price_cents, validity_days) in [
        ("Wiki 1", 9_900, 7),
        ("Wiki 2", 19_900, 30),
        ("Wiki 3", 49_900, 90),
    ] {
        let pkg = queries::upsert_package(
            &conn,
            &UpsertPackage {
                name: name.to_string(),
                price_cents,
                validity_days,
            },
        )
        .expect("Failed to seed package");
        tracing::info!(
            "Package: {} ({} cents, {} days)",
            pkg.name,
            pkg.price_cents,
            pkg.validity_days
        );
    }

    for (key, value, description) in [
        ("support_phone", "+10000000000", "Support contact shown in the app"),
        ("paywall_enabled", "true", "Whether free users hit the paywall"),
    ] {
        queries::upsert_setting(
            &conn,
            &UpsertSetting {
                key: key.to_string(),
                value: value.to_string(),
                description: Some(description.to_string()),
            },
        )
        .expect("Failed to seed setting");
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "streampass=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = pool.get().expect("Failed to get db connection");
        init_db(&conn).expect("Failed to initialize schema");
    }

    let signer =
        TokenSigner::load_or_generate(&config.signing_key_path).expect("Failed to load signing key");

    let gateway = config.gateway_url.as_deref().map(|url| {
        GatewayClient::new(url, Duration::from_secs(config.gateway_timeout_secs))
            .expect("Failed to build gateway client")
    });
    if gateway.is_none() {
        tracing::warn!("No GATEWAY_URL configured: initiated payments stay PENDING");
    }

    let state = AppState {
        settings: SettingsCache::new(pool.clone(), Duration::from_secs(config.settings_ttl_secs)),
        db: pool,
        signer,
        gateway,
        webhook_secret: config.webhook_secret.clone(),
        admin_api_key: config.admin_api_key.clone(),
        base_url: config.base_url.clone(),
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::error!("--seed requires STREAMPASS_ENV=dev");
            std::process::exit(1);
        }
        seed_dev_data(&state);
    }

    // Heal any grant recorded on a COMPLETED transaction that never reached
    // its user (crash between the two ledger writes).
    {
        let conn = state.db.get().expect("Failed to get db connection");
        match reconcile::recover_unapplied_grants(&conn) {
            Ok(0) => {}
            Ok(n) => tracing::warn!("Recovered {} unapplied subscription grants", n),
            Err(e) => tracing::error!("Grant recovery scan failed: {}", e),
        }
    }

    let app = Router::new()
        // Public endpoints (no auth)
        .merge(handlers::public::router())
        // Webhook endpoint (signature auth when configured)
        .merge(handlers::webhooks::router())
        // Admin API (static bearer key)
        .merge(handlers::admin::router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("streampass server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
