//! streampass - subscription backend for a streaming app
//!
//! This library provides the payment reconciliation core: the transaction and
//! subscription ledgers, the package catalog, a TTL'd settings cache, the
//! payment-gateway client, and the HTTP handlers that drive them.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod reconcile;
pub mod settings;
