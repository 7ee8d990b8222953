//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors so corrupt rows surface instead of panicking.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const USER_COLS: &str =
    "id, installation_id, name, phone_number, subscription_expires_at, created_at, last_seen_at";

pub const TRANSACTION_COLS: &str = "order_id, payer_name, phone_number, package_name, amount_cents, status, installation_id, access_token, granted_expires_at, created_at, updated_at";

pub const PACKAGE_COLS: &str = "name, price_cents, validity_days, created_at";

pub const SETTING_COLS: &str = "key, value, description, updated_at";

// ============ FromRow Implementations ============

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            installation_id: row.get(1)?,
            name: row.get(2)?,
            phone_number: row.get(3)?,
            subscription_expires_at: row.get(4)?,
            created_at: row.get(5)?,
            last_seen_at: row.get(6)?,
        })
    }
}

impl FromRow for Transaction {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Transaction {
            order_id: row.get(0)?,
            payer_name: row.get(1)?,
            phone_number: row.get(2)?,
            package_name: row.get(3)?,
            amount_cents: row.get(4)?,
            status: parse_enum(row, 5, "status")?,
            installation_id: row.get(6)?,
            access_token: row.get(7)?,
            granted_expires_at: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

impl FromRow for Package {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Package {
            name: row.get(0)?,
            price_cents: row.get(1)?,
            validity_days: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl FromRow for Setting {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Setting {
            key: row.get(0)?,
            value: row.get(1)?,
            description: row.get(2)?,
            updated_at: row.get(3)?,
        })
    }
}
