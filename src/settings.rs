//! TTL'd in-memory settings cache.
//!
//! Owned by `AppState` and injected into handlers; never a global. Reads go
//! through an immutable snapshot that a reload builds off to the side and
//! swaps in whole, so concurrent readers never observe a half-replaced map.
//! Reload failures are logged and the stale snapshot keeps serving.
//!
//! `set`/`delete` update the snapshot immediately and independently of the
//! backing store; callers write through to the store themselves.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::db::{queries, DbPool};

#[derive(Debug)]
struct Snapshot {
    values: HashMap<String, String>,
    /// None until the first successful load (always stale).
    loaded_at: Option<Instant>,
}

#[derive(Clone)]
pub struct SettingsCache {
    pool: DbPool,
    ttl: Duration,
    inner: Arc<RwLock<Arc<Snapshot>>>,
}

impl SettingsCache {
    /// Create a cache with an empty, already-stale snapshot; the first read
    /// triggers a load.
    pub fn new(pool: DbPool, ttl: Duration) -> Self {
        let empty = Snapshot {
            values: HashMap::new(),
            loaded_at: None,
        };
        Self {
            pool,
            ttl,
            inner: Arc::new(RwLock::new(Arc::new(empty))),
        }
    }

    fn current(&self) -> Arc<Snapshot> {
        self.inner.read().expect("settings cache lock poisoned").clone()
    }

    fn swap(&self, snapshot: Snapshot) {
        *self.inner.write().expect("settings cache lock poisoned") = Arc::new(snapshot);
    }

    fn is_stale(&self, snapshot: &Snapshot) -> bool {
        snapshot.loaded_at.is_none_or(|t| t.elapsed() >= self.ttl)
    }

    /// Rebuild the snapshot from the backing store. Errors are swallowed:
    /// the stale snapshot continues to serve and the failure is logged.
    fn reload(&self) {
        let conn = match self.pool.get() {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Settings reload failed (pool): {}", e);
                return;
            }
        };
        match queries::list_settings(&conn) {
            Ok(rows) => {
                let values = rows.into_iter().map(|s| (s.key, s.value)).collect();
                self.swap(Snapshot {
                    values,
                    loaded_at: Some(Instant::now()),
                });
            }
            Err(e) => {
                tracing::warn!("Settings reload failed (query): {}", e);
            }
        }
    }

    /// Get a setting, falling back when the key is absent. A stale snapshot
    /// triggers a full reload before answering.
    pub fn get(&self, key: &str, fallback: &str) -> String {
        if self.is_stale(&self.current()) {
            self.reload();
        }
        self.current()
            .values
            .get(key)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }

    /// The full key→value projection (the public settings view).
    pub fn snapshot(&self) -> HashMap<String, String> {
        if self.is_stale(&self.current()) {
            self.reload();
        }
        self.current().values.clone()
    }

    /// Upsert a key in the cached snapshot. Does not touch the store.
    pub fn set(&self, key: &str, value: &str) {
        let current = self.current();
        let mut values = current.values.clone();
        values.insert(key.to_string(), value.to_string());
        self.swap(Snapshot {
            values,
            loaded_at: current.loaded_at,
        });
    }

    /// Evict a key from the cached snapshot. Does not touch the store.
    pub fn delete(&self, key: &str) {
        let current = self.current();
        let mut values = current.values.clone();
        values.remove(key);
        self.swap(Snapshot {
            values,
            loaded_at: current.loaded_at,
        });
    }
}
