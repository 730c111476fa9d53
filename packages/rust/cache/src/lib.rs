//! In-process TTL cache facade.
//!
//! A shared string-keyed map with per-entry expiration, mirroring the
//! `SETEX`/`GET` subset of a key-value cache. An entry past its expiry is
//! equivalent to absent. Every use in the retrieval core is either a
//! read-through miss-populate or an unconditional overwrite, so no
//! read-modify-write atomicity is offered.
//!
//! Expiry is measured on [`tokio::time::Instant`], so tests can pause and
//! advance the clock.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

/// Cache key prefix for refresh payloads.
pub const API_KEY_PREFIX: &str = "api_";

/// Cache key prefix for academic resources.
pub const ACADEMIC_KEY_PREFIX: &str = "academic_";

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Shared TTL cache. One instance is owned by the process-wide service
/// and shared by reference across requests.
pub struct TtlCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl TtlCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Get the value for `key`, or `None` if absent or expired.
    ///
    /// Expired entries are dropped on read.
    pub async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                trace!(key, "cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                trace!(key, "cache entry expired");
                entries.remove(key);
                None
            }
            None => {
                trace!(key, "cache miss");
                None
            }
        }
    }

    /// Set `key` to `value`, expiring after `ttl`. Overwrites unconditionally.
    pub async fn set(&self, key: &str, value: String, ttl: Duration) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache key for a sector's refresh payload.
pub fn api_key(sector: &str) -> String {
    format!("{API_KEY_PREFIX}{sector}")
}

/// Cache key for a sector's academic resources.
pub fn academic_key(sector: &str) -> String {
    format!("{ACADEMIC_KEY_PREFIX}{sector}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_absent_key() {
        let cache = TtlCache::new();
        assert_eq!(cache.get("api_physics").await, None);
    }

    #[tokio::test]
    async fn set_then_get() {
        let cache = TtlCache::new();
        cache
            .set("api_physics", "payload".into(), Duration::from_secs(60))
            .await;
        assert_eq!(cache.get("api_physics").await, Some("payload".into()));
    }

    #[tokio::test]
    async fn overwrite_replaces_value_and_ttl() {
        let cache = TtlCache::new();
        cache
            .set("academic_math", "old".into(), Duration::from_secs(1))
            .await;
        cache
            .set("academic_math", "new".into(), Duration::from_secs(60))
            .await;
        assert_eq!(cache.get("academic_math").await, Some("new".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let cache = TtlCache::new();
        cache
            .set("api_physics", "payload".into(), Duration::from_secs(3600))
            .await;

        tokio::time::advance(Duration::from_secs(3599)).await;
        assert!(cache.get("api_physics").await.is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("api_physics").await, None);
        // A second read after expiry is still a plain miss.
        assert_eq!(cache.get("api_physics").await, None);
    }

    #[test]
    fn key_namespaces() {
        assert_eq!(api_key("physics"), "api_physics");
        assert_eq!(academic_key("physics"), "academic_physics");
    }
}
