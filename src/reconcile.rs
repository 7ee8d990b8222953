//! Payment reconciliation engine.
//!
//! Converts a gateway's terminal payment notification into durable
//! subscription state: resolves the transaction, resolves or creates the
//! owning user strictly by installation identifier, extends the rolling
//! expiry from the later of "now" and the current expiry, and issues a
//! signed access token.
//!
//! Writes are ordered: the transaction row (COMPLETED + token +
//! granted_expires_at) is persisted before the user row. There is no
//! cross-record atomicity; a crash between the two writes is healed by
//! `recover_unapplied_grants` at startup, which re-applies any grant
//! recorded on a COMPLETED transaction that never reached its user.

use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries;
use crate::error::{AppError, Result};
use crate::jwt::{AccessClaims, TokenSigner};
use crate::models::{CreateUser, Transaction, TransactionStatus, User};

/// Validity applied when a transaction's package name resolves to nothing
/// in the catalog.
pub const DEFAULT_VALIDITY_DAYS: i64 = 30;

const SECONDS_PER_DAY: i64 = 86400;

/// A terminal-status notification from the payment gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentNotification {
    pub order_id: String,
    pub payment_status: TransactionStatus,
}

/// What reconciliation did. Every variant maps to webhook success; the
/// distinction matters for status polling and for tests.
#[derive(Debug)]
pub enum ReconcileOutcome {
    /// No transaction for this order id. Accepted without any state change
    /// so the gateway does not retry.
    UnknownOrder,
    /// The transaction was already terminal. No state change; for COMPLETED
    /// orders the originally issued token is replayed.
    AlreadySettled {
        status: TransactionStatus,
        token: Option<String>,
    },
    /// A non-COMPLETED terminal status was recorded. No user mutation.
    MarkedTerminal { status: TransactionStatus },
    /// The grant was applied and a token issued.
    Granted {
        user: User,
        token: String,
        expires_at: i64,
    },
}

/// Reconcile one notification. `now` is passed explicitly so the expiry
/// arithmetic is deterministic under test.
pub fn reconcile(
    conn: &Connection,
    signer: &TokenSigner,
    notification: &PaymentNotification,
    now: i64,
) -> Result<ReconcileOutcome> {
    if notification.order_id.trim().is_empty() {
        return Err(AppError::BadRequest("Missing order identifier".into()));
    }
    if !notification.payment_status.is_terminal() {
        return Err(AppError::BadRequest(
            "Payment status must be terminal".into(),
        ));
    }

    let tx = match queries::get_transaction(conn, &notification.order_id)? {
        Some(tx) => tx,
        None => {
            tracing::info!(
                "Webhook for unknown order {}, ignoring",
                notification.order_id
            );
            return Ok(ReconcileOutcome::UnknownOrder);
        }
    };

    // Terminal statuses are monotonic: duplicate or out-of-order deliveries
    // replay the settled result instead of re-applying the grant.
    if tx.status.is_terminal() {
        tracing::info!(
            "Order {} already settled as {}, webhook is a no-op",
            tx.order_id,
            tx.status
        );
        return Ok(ReconcileOutcome::AlreadySettled {
            status: tx.status,
            token: tx.access_token,
        });
    }

    if notification.payment_status != TransactionStatus::Completed {
        queries::mark_transaction_status(conn, &tx.order_id, notification.payment_status)?;
        return Ok(ReconcileOutcome::MarkedTerminal {
            status: notification.payment_status,
        });
    }

    grant(conn, signer, &tx, now)
}

/// Apply a COMPLETED payment: compute the new expiry, persist transaction
/// then user, and issue the access token.
fn grant(
    conn: &Connection,
    signer: &TokenSigner,
    tx: &Transaction,
    now: i64,
) -> Result<ReconcileOutcome> {
    let validity_days = match queries::get_package_by_name(conn, &tx.package_name)? {
        Some(pkg) => pkg.validity_days,
        None => {
            tracing::warn!(
                "Order {} names unknown package '{}', using {}-day default",
                tx.order_id,
                tx.package_name,
                DEFAULT_VALIDITY_DAYS
            );
            DEFAULT_VALIDITY_DAYS
        }
    };

    // The user is resolved strictly by installation identifier. Falling back
    // to the phone number would let a reused number capture another
    // account's subscription.
    let existing = queries::get_user_by_installation(conn, &tx.installation_id)?;

    let base = match existing.as_ref().and_then(|u| u.subscription_expires_at) {
        Some(expiry) => expiry.max(now),
        None => now,
    };
    let expires_at = base + validity_days * SECONDS_PER_DAY;

    let token = signer.sign_access_token(
        &tx.installation_id,
        &AccessClaims {
            premium_until: expires_at,
            package: tx.package_name.clone(),
        },
        validity_days,
    )?;

    // Transaction first: once COMPLETED is durable, the recorded grant can
    // always be re-applied to the user by the recovery scan.
    queries::complete_transaction(conn, &tx.order_id, &token, expires_at)?;

    let user = match existing {
        Some(user) => {
            queries::apply_subscription_grant(conn, &user.id, expires_at)?;
            let user = adopt_phone_number(conn, user, tx.phone_number.as_deref())?;
            User {
                subscription_expires_at: Some(expires_at),
                ..user
            }
        }
        None => queries::create_user(
            conn,
            &CreateUser {
                installation_id: tx.installation_id.clone(),
                name: Some(tx.payer_name.clone()),
                phone_number: unclaimed_phone(conn, tx.phone_number.as_deref())?,
                subscription_expires_at: Some(expires_at),
            },
        )?,
    };

    tracing::info!(
        "Order {} reconciled: installation {} premium until {}",
        tx.order_id,
        tx.installation_id,
        expires_at
    );

    Ok(ReconcileOutcome::Granted {
        user,
        token,
        expires_at,
    })
}

/// Adopt the transaction's phone number onto a user that has none, unless a
/// different user already owns it (skip silently, log only).
pub fn adopt_phone_number(
    conn: &Connection,
    user: User,
    phone_number: Option<&str>,
) -> Result<User> {
    let Some(phone) = phone_number.filter(|p| !p.is_empty()) else {
        return Ok(user);
    };
    if user.phone_number.is_some() {
        return Ok(user);
    }

    match queries::get_user_by_phone(conn, phone)? {
        Some(owner) if owner.id != user.id => {
            tracing::warn!(
                "Phone number already claimed by user {}, not adopting onto {}",
                owner.id,
                user.id
            );
            Ok(user)
        }
        _ => {
            queries::set_user_phone(conn, &user.id, phone)?;
            Ok(User {
                phone_number: Some(phone.to_string()),
                ..user
            })
        }
    }
}

/// Phone number for a user created during reconciliation: None when another
/// user already owns it.
fn unclaimed_phone(conn: &Connection, phone_number: Option<&str>) -> Result<Option<String>> {
    let Some(phone) = phone_number.filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    match queries::get_user_by_phone(conn, phone)? {
        Some(owner) => {
            tracing::warn!(
                "Phone number already claimed by user {}, creating user without it",
                owner.id
            );
            Ok(None)
        }
        None => Ok(Some(phone.to_string())),
    }
}

/// Startup recovery: re-apply grants recorded on COMPLETED transactions that
/// never reached the owning user (crash between the two writes). Setting the
/// expiry to the recorded grant, rather than extending, keeps this
/// idempotent.
pub fn recover_unapplied_grants(conn: &Connection) -> Result<usize> {
    let stranded = queries::find_unapplied_grants(conn)?;
    let mut repaired = 0;

    for tx in stranded {
        let Some(expires_at) = tx.granted_expires_at else {
            continue;
        };
        match queries::get_user_by_installation(conn, &tx.installation_id)? {
            Some(user) => {
                // A later transaction may already have rolled the expiry past
                // this grant; never move it backwards.
                if user.subscription_expires_at.is_some_and(|e| e >= expires_at) {
                    continue;
                }
                queries::apply_subscription_grant(conn, &user.id, expires_at)?;
            }
            None => {
                queries::create_user(
                    conn,
                    &CreateUser {
                        installation_id: tx.installation_id.clone(),
                        name: Some(tx.payer_name.clone()),
                        phone_number: unclaimed_phone(conn, tx.phone_number.as_deref())?,
                        subscription_expires_at: Some(expires_at),
                    },
                )?;
            }
        }
        tracing::warn!(
            "Recovered unapplied grant for order {} (installation {})",
            tx.order_id,
            tx.installation_id
        );
        repaired += 1;
    }

    Ok(repaired)
}
