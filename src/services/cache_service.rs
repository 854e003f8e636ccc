//! Cache Service - namespaced get/set over Redis
//!
//! The cache is a performance optimization, never a correctness
//! dependency: every backend failure degrades to a miss (get) or a
//! silent no-op (set/delete) and bumps the error counter.

use redis::AsyncCommands;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use utoipa::ToSchema;

/// TTL for full query envelopes (`query:` namespace)
pub const TTL_QUERY_SECS: u64 = 1800;
/// TTL for warehouse data snapshots (`data:` namespace)
pub const TTL_DATA_SECS: u64 = 900;
/// TTL for intent classifications and insight lists
pub const TTL_INSIGHTS_SECS: u64 = 7200;

/// Process-wide cache counters, updated atomically on every operation
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
}

/// Consistent snapshot of the counters
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub sets: u64,
    pub deletes: u64,
    pub hit_rate: f64,
}

impl CacheStats {
    fn snapshot(&self) -> CacheStatsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        CacheStatsSnapshot {
            hits,
            misses,
            errors: self.errors.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            hit_rate: hits as f64 / (hits + misses).max(1) as f64,
        }
    }
}

/// Redis-backed cache adapter
///
/// Built with no client when the cache URL is unset: every get is a
/// miss and every set a no-op, so the pipeline runs unchanged.
pub struct CacheService {
    client: Option<redis::Client>,
    op_timeout: Duration,
    default_ttl_secs: u64,
    stats: CacheStats,
}

impl CacheService {
    pub fn new(url: &str, timeout_ms: u64, default_ttl_secs: u64) -> Self {
        let client = if url.is_empty() {
            tracing::warn!("Cache URL not configured; caching disabled");
            None
        } else {
            match redis::Client::open(url) {
                Ok(client) => Some(client),
                Err(e) => {
                    tracing::warn!("Invalid cache URL: {}. Caching disabled.", e);
                    None
                },
            }
        };

        Self {
            client,
            op_timeout: Duration::from_millis(timeout_ms),
            default_ttl_secs: default_ttl_secs.max(1),
            stats: CacheStats::default(),
        }
    }

    /// Cache with no backend, for tests and degraded deployments
    pub fn disabled() -> Self {
        Self {
            client: None,
            op_timeout: Duration::from_millis(100),
            default_ttl_secs: 3600,
            stats: CacheStats::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    // Key builders, one per namespace

    pub fn query_key(fingerprint: &str) -> String {
        format!("query:{}", fingerprint)
    }

    pub fn intent_key(fingerprint: &str) -> String {
        format!("intent:{}", fingerprint)
    }

    pub fn insights_key(fingerprint: &str) -> String {
        format!("insights:{}", fingerprint)
    }

    pub fn data_key(endpoint: &str, params_hash: &str) -> String {
        format!("data:{}:{}", endpoint, params_hash)
    }

    /// Look up a JSON-encoded value. Backend errors count as misses.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let Some(client) = self.client.as_ref() else {
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        let result: Result<Option<String>, _> =
            tokio::time::timeout(self.op_timeout, async {
                let mut conn = client
                    .get_async_connection()
                    .await
                    .map_err(|e| e.to_string())?;
                conn.get::<_, Option<String>>(key)
                    .await
                    .map_err(|e| e.to_string())
            })
            .await
            .map_err(|_| "cache operation timed out".to_string())
            .and_then(|r| r);

        match result {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    Some(value)
                },
                Err(e) => {
                    tracing::warn!("Cache entry for {} failed to decode: {}", key, e);
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                    None
                },
            },
            Ok(None) => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            },
            Err(e) => {
                tracing::warn!("Cache get failed for {}: {}", key, e);
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                None
            },
        }
    }

    /// Store a JSON-encoded value with a TTL. A TTL of 0 means "use the
    /// configured default". Failures are silent.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) -> bool {
        let Some(client) = self.client.as_ref() else {
            return false;
        };
        let ttl_secs = if ttl_secs == 0 { self.default_ttl_secs } else { ttl_secs };

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Cache value for {} is not encodable: {}", key, e);
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                return false;
            },
        };

        let result: Result<(), String> = tokio::time::timeout(self.op_timeout, async {
            let mut conn = client
                .get_async_connection()
                .await
                .map_err(|e| e.to_string())?;
            conn.set_ex::<_, _, ()>(key, raw, ttl_secs)
                .await
                .map_err(|e| e.to_string())
        })
        .await
        .map_err(|_| "cache operation timed out".to_string())
        .and_then(|r| r);

        match result {
            Ok(()) => {
                self.stats.sets.fetch_add(1, Ordering::Relaxed);
                true
            },
            Err(e) => {
                tracing::warn!("Cache set failed for {}: {}", key, e);
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                false
            },
        }
    }

    /// Remove a key. Failures are silent.
    pub async fn delete(&self, key: &str) -> bool {
        let Some(client) = self.client.as_ref() else {
            return false;
        };

        let result: Result<(), String> = tokio::time::timeout(self.op_timeout, async {
            let mut conn = client
                .get_async_connection()
                .await
                .map_err(|e| e.to_string())?;
            conn.del::<_, ()>(key).await.map_err(|e| e.to_string())
        })
        .await
        .map_err(|_| "cache operation timed out".to_string())
        .and_then(|r| r);

        match result {
            Ok(()) => {
                self.stats.deletes.fetch_add(1, Ordering::Relaxed);
                true
            },
            Err(e) => {
                tracing::warn!("Cache delete failed for {}: {}", key, e);
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                false
            },
        }
    }

    /// Existence check without counting toward hits/misses
    pub async fn exists(&self, key: &str) -> bool {
        let Some(client) = self.client.as_ref() else {
            return false;
        };

        let result: Result<bool, String> = tokio::time::timeout(self.op_timeout, async {
            let mut conn = client
                .get_async_connection()
                .await
                .map_err(|e| e.to_string())?;
            conn.exists::<_, bool>(key).await.map_err(|e| e.to_string())
        })
        .await
        .map_err(|_| "cache operation timed out".to_string())
        .and_then(|r| r);

        match result {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Cache exists check failed for {}: {}", key, e);
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                false
            },
        }
    }
}
