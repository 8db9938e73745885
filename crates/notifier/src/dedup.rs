//! Idempotency key store for suppressing duplicate deliveries.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

/// How long a delivered key suppresses repeats.
pub const DEFAULT_DEDUP_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Set-if-absent key store with expiry.
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Claim `key` for `ttl`. Returns `false` if it is already claimed.
    async fn claim(&self, key: &str, ttl: Duration) -> bool;

    /// Drop a claim so the key can be used again.
    async fn release(&self, key: &str);
}

/// In-process [`DedupStore`].
#[derive(Debug, Default)]
pub struct MemoryDedupStore {
    keys: Mutex<HashMap<String, Instant>>,
}

impl MemoryDedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live claims.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock().values().filter(|expires| **expires > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn claim_at(&self, key: &str, ttl: Duration, now: Instant) -> bool {
        let mut keys = self.lock();
        keys.retain(|_, expires| *expires > now);

        if keys.contains_key(key) {
            debug!(key, "Dedup key already claimed");
            return false;
        }
        keys.insert(key.to_string(), now + ttl);
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Instant>> {
        self.keys.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DedupStore for MemoryDedupStore {
    async fn claim(&self, key: &str, ttl: Duration) -> bool {
        self.claim_at(key, ttl, Instant::now())
    }

    async fn release(&self, key: &str) {
        self.lock().remove(key);
    }
}
