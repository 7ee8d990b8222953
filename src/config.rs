use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub base_url: String,
    /// Payment gateway endpoint. None = gateway calls disabled (dev mode),
    /// initiated transactions stay PENDING until a webhook arrives.
    pub gateway_url: Option<String>,
    /// Timeout for outbound gateway calls, in seconds.
    pub gateway_timeout_secs: u64,
    /// Shared secret for webhook HMAC signatures. None = signature check skipped.
    pub webhook_secret: Option<String>,
    /// Bearer key for the admin API. None = admin endpoints disabled.
    pub admin_api_key: Option<String>,
    /// Path to the Ed25519 token signing key (generated on first run).
    pub signing_key_path: String,
    /// How long the settings cache serves a snapshot before reloading.
    pub settings_ttl_secs: u64,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("STREAMPASS_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url = env::var("BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", host, port));

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "streampass.db".to_string()),
            base_url,
            gateway_url: env::var("GATEWAY_URL").ok().filter(|v| !v.is_empty()),
            gateway_timeout_secs: env::var("GATEWAY_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            webhook_secret: env::var("WEBHOOK_SECRET").ok().filter(|v| !v.is_empty()),
            admin_api_key: env::var("ADMIN_API_KEY").ok().filter(|v| !v.is_empty()),
            signing_key_path: env::var("SIGNING_KEY_PATH")
                .unwrap_or_else(|_| "streampass_signing.key".to_string()),
            settings_ttl_secs: env::var("SETTINGS_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
