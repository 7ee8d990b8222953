use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Users (one row per device installation)
        -- installation_id is the sole key linking payments to users.
        -- Premium is derived from subscription_expires_at, never stored.
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            installation_id TEXT NOT NULL UNIQUE,
            name TEXT,
            phone_number TEXT,
            subscription_expires_at INTEGER,
            created_at INTEGER NOT NULL,
            last_seen_at INTEGER NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_users_phone
            ON users(phone_number) WHERE phone_number IS NOT NULL;

        -- Transactions (one row per payment attempt, keyed by order id)
        -- granted_expires_at records the expiry a COMPLETED transaction
        -- granted, so an interrupted user write can be recovered.
        CREATE TABLE IF NOT EXISTS transactions (
            order_id TEXT PRIMARY KEY,
            payer_name TEXT NOT NULL,
            phone_number TEXT,
            package_name TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'PENDING'
                CHECK (status IN ('PENDING', 'COMPLETED', 'FAILED', 'CANCELLED', 'EXPIRED')),
            installation_id TEXT NOT NULL,
            access_token TEXT,
            granted_expires_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_transactions_installation
            ON transactions(installation_id);
        CREATE INDEX IF NOT EXISTS idx_transactions_status
            ON transactions(status);

        -- Packages (plans; name matched case-insensitively)
        CREATE TABLE IF NOT EXISTS packages (
            name TEXT PRIMARY KEY COLLATE NOCASE,
            price_cents INTEGER NOT NULL,
            validity_days INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        );

        -- Settings (key/value configuration, cached with a TTL in-process)
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            description TEXT,
            updated_at INTEGER NOT NULL
        );
        "#,
    )?;
    Ok(())
}
