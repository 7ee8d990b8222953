use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

use super::from_row::{
    query_all, query_one, PACKAGE_COLS, SETTING_COLS, TRANSACTION_COLS, USER_COLS,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a fresh order identifier for a payment attempt.
pub fn generate_order_id() -> String {
    Uuid::new_v4().to_string()
}

// ============ Users ============

pub fn create_user(conn: &Connection, input: &CreateUser) -> Result<User> {
    let user = User {
        id: gen_id(),
        installation_id: input.installation_id.clone(),
        name: input.name.clone(),
        phone_number: input.phone_number.clone(),
        subscription_expires_at: input.subscription_expires_at,
        created_at: now(),
        last_seen_at: now(),
    };

    conn.execute(
        "INSERT INTO users (id, installation_id, name, phone_number, subscription_expires_at, created_at, last_seen_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.id,
            user.installation_id,
            user.name,
            user.phone_number,
            user.subscription_expires_at,
            user.created_at,
            user.last_seen_at,
        ],
    )?;

    Ok(user)
}

pub fn get_user_by_installation(
    conn: &Connection,
    installation_id: &str,
) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE installation_id = ?1", USER_COLS),
        &[&installation_id],
    )
}

pub fn get_user_by_phone(conn: &Connection, phone_number: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE phone_number = ?1", USER_COLS),
        &[&phone_number],
    )
}

/// Record a device login: bump last_seen and refresh the name if supplied.
pub fn touch_user_login(conn: &Connection, user_id: &str, name: Option<&str>) -> Result<()> {
    match name {
        Some(n) => conn.execute(
            "UPDATE users SET last_seen_at = ?1, name = ?2 WHERE id = ?3",
            params![now(), n, user_id],
        )?,
        None => conn.execute(
            "UPDATE users SET last_seen_at = ?1 WHERE id = ?2",
            params![now(), user_id],
        )?,
    };
    Ok(())
}

pub fn set_user_phone(conn: &Connection, user_id: &str, phone_number: &str) -> Result<()> {
    conn.execute(
        "UPDATE users SET phone_number = ?1 WHERE id = ?2",
        params![phone_number, user_id],
    )?;
    Ok(())
}

/// Apply a subscription grant: set the rolling expiry to an absolute value.
/// Idempotent (set, not extend) so the recovery scan can safely re-run it.
pub fn apply_subscription_grant(conn: &Connection, user_id: &str, expires_at: i64) -> Result<()> {
    conn.execute(
        "UPDATE users SET subscription_expires_at = ?1 WHERE id = ?2",
        params![expires_at, user_id],
    )?;
    Ok(())
}

// ============ Transactions ============

pub fn create_transaction(conn: &Connection, input: &CreateTransaction) -> Result<Transaction> {
    let tx = Transaction {
        order_id: input.order_id.clone(),
        payer_name: input.payer_name.clone(),
        phone_number: input.phone_number.clone(),
        package_name: input.package_name.clone(),
        amount_cents: input.amount_cents,
        status: TransactionStatus::Pending,
        installation_id: input.installation_id.clone(),
        access_token: None,
        granted_expires_at: None,
        created_at: now(),
        updated_at: now(),
    };

    conn.execute(
        "INSERT INTO transactions (order_id, payer_name, phone_number, package_name, amount_cents, status, installation_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            tx.order_id,
            tx.payer_name,
            tx.phone_number,
            tx.package_name,
            tx.amount_cents,
            tx.status.as_str(),
            tx.installation_id,
            tx.created_at,
            tx.updated_at,
        ],
    )?;

    Ok(tx)
}

pub fn get_transaction(conn: &Connection, order_id: &str) -> Result<Option<Transaction>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM transactions WHERE order_id = ?1",
            TRANSACTION_COLS
        ),
        &[&order_id],
    )
}

/// Move a PENDING transaction to a non-COMPLETED terminal status.
/// Returns false when the row was already terminal (monotonic transitions).
pub fn mark_transaction_status(
    conn: &Connection,
    order_id: &str,
    status: TransactionStatus,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE transactions SET status = ?1, updated_at = ?2
         WHERE order_id = ?3 AND status = 'PENDING'",
        params![status.as_str(), now(), order_id],
    )?;
    Ok(affected > 0)
}

/// Complete a transaction: terminal status, issued token, and the expiry the
/// grant will give the user. Written before the user row so a crash between
/// the two writes is recoverable.
pub fn complete_transaction(
    conn: &Connection,
    order_id: &str,
    access_token: &str,
    granted_expires_at: i64,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE transactions
         SET status = 'COMPLETED', access_token = ?1, granted_expires_at = ?2, updated_at = ?3
         WHERE order_id = ?4 AND status = 'PENDING'",
        params![access_token, granted_expires_at, now(), order_id],
    )?;
    Ok(affected > 0)
}

/// COMPLETED transactions whose grant never reached the owning user: the
/// user row is missing, has no expiry, or has an expiry behind the recorded
/// grant. Input to the startup recovery scan.
pub fn find_unapplied_grants(conn: &Connection) -> Result<Vec<Transaction>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM transactions t
             WHERE t.status = 'COMPLETED' AND t.granted_expires_at IS NOT NULL
               AND NOT EXISTS (
                   SELECT 1 FROM users u
                   WHERE u.installation_id = t.installation_id
                     AND u.subscription_expires_at >= t.granted_expires_at
               )",
            TRANSACTION_COLS
        ),
        &[],
    )
}

// ============ Packages ============

/// Look up a package by name. The name column uses NOCASE collation, so the
/// match is case-insensitive.
pub fn get_package_by_name(conn: &Connection, name: &str) -> Result<Option<Package>> {
    query_one(
        conn,
        &format!("SELECT {} FROM packages WHERE name = ?1", PACKAGE_COLS),
        &[&name],
    )
}

pub fn list_packages(conn: &Connection) -> Result<Vec<Package>> {
    query_all(
        conn,
        &format!("SELECT {} FROM packages ORDER BY price_cents", PACKAGE_COLS),
        &[],
    )
}

pub fn upsert_package(conn: &Connection, input: &UpsertPackage) -> Result<Package> {
    conn.execute(
        "INSERT INTO packages (name, price_cents, validity_days, created_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(name) DO UPDATE SET price_cents = ?2, validity_days = ?3",
        params![input.name, input.price_cents, input.validity_days, now()],
    )?;

    get_package_by_name(conn, &input.name)?.ok_or_else(|| {
        crate::error::AppError::Internal("Package row missing after upsert".into())
    })
}

pub fn delete_package(conn: &Connection, name: &str) -> Result<bool> {
    let affected = conn.execute("DELETE FROM packages WHERE name = ?1", params![name])?;
    Ok(affected > 0)
}

// ============ Settings ============

pub fn list_settings(conn: &Connection) -> Result<Vec<Setting>> {
    query_all(
        conn,
        &format!("SELECT {} FROM settings ORDER BY key", SETTING_COLS),
        &[],
    )
}

pub fn upsert_setting(conn: &Connection, input: &UpsertSetting) -> Result<Setting> {
    let updated_at = now();
    conn.execute(
        "INSERT INTO settings (key, value, description, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(key) DO UPDATE SET value = ?2, description = ?3, updated_at = ?4",
        params![input.key, input.value, input.description, updated_at],
    )?;

    Ok(Setting {
        key: input.key.clone(),
        value: input.value.clone(),
        description: input.description.clone(),
        updated_at,
    })
}

pub fn delete_setting(conn: &Connection, key: &str) -> Result<bool> {
    let affected = conn.execute("DELETE FROM settings WHERE key = ?1", params![key])?;
    Ok(affected > 0)
}
