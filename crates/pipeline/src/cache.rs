//! Context cache — TTL-bounded bundles shared across requests.
//!
//! One instance is built at startup and injected as `Arc<ContextCache>`.
//! Keys are structural: tenant (business + user), intent and the
//! recipe's discriminator, so two tenants can never read each other's
//! bundle. Concurrent population of the same key is last-writer-wins.
//!
//! Time comes from `tokio::time::Instant` so tests can pause and advance
//! the clock.

use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use steward_config::CacheConfig;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Structural cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub business_id: String,
    pub user_id: String,
    pub intent: String,
    pub discriminator: String,
}

impl CacheKey {
    pub fn new(
        business_id: impl Into<String>,
        user_id: impl Into<String>,
        intent: impl Into<String>,
        discriminator: impl Into<String>,
    ) -> Self {
        Self {
            business_id: business_id.into(),
            user_id: user_id.into(),
            intent: intent.into(),
            discriminator: discriminator.into(),
        }
    }
}

struct CacheEntry {
    bundle: Value,
    expires_at: Instant,
    inserted_at: Instant,
}

/// Bounded TTL cache of pruned context bundles.
pub struct ContextCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl ContextCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(Duration::from_secs(config.ttl_secs), config.max_entries)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Unexpired bundle for `key`. An expired entry is removed.
    pub async fn get(&self, key: &CacheKey) -> Option<Value> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Some(entry.bundle.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write().await;
        // Another writer may have refreshed it in between
        if entries.get(key).is_some_and(|e| e.expires_at <= now) {
            entries.remove(key);
            debug!(intent = %key.intent, "Cache entry expired");
        }
        None
    }

    /// Store a bundle under the configured TTL, evicting when full.
    pub async fn insert(&self, key: CacheKey, bundle: Value) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            entries.retain(|_, e| e.expires_at > now);
            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, e)| e.inserted_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key,
            CacheEntry {
                bundle,
                expires_at: now + self.ttl,
                inserted_at: now,
            },
        );
    }

    /// Drop every entry. Returns how many were removed.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let n = entries.len();
        entries.clear();
        n
    }

    /// Drop expired entries. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
