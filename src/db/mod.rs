mod from_row;
pub mod queries;
mod schema;

pub use schema::init_db;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::jwt::TokenSigner;
use crate::payments::GatewayClient;
use crate::settings::SettingsCache;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state: database pool plus the collaborators the handlers need.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// TTL'd settings cache, owned here and injected (never a global).
    pub settings: SettingsCache,
    /// Signs access tokens issued on reconciliation.
    pub signer: TokenSigner,
    /// Outbound payment-gateway client. None = dev mode, no gateway calls.
    pub gateway: Option<GatewayClient>,
    /// Shared secret for inbound webhook signatures. None = check skipped.
    pub webhook_secret: Option<String>,
    /// Bearer key for admin endpoints. None = admin API disabled.
    pub admin_api_key: Option<String>,
    pub base_url: String,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
