use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{KeyValueStore, Result};

/// Cached payload plus the moment it was captured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEnvelope<T> {
    pub data: Vec<T>,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// Outcome of reading the envelope
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    Fresh(Vec<T>),
    Stale { age_ms: i64 },
    Missing,
}

/// Summary of whatever sits under the cache key, for inspection
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeInfo {
    pub entries: usize,
    pub timestamp: i64,
    pub age_ms: i64,
    pub fresh: bool,
}

/// A single envelope stored under a fixed key with a freshness window
#[derive(Clone)]
pub struct EnvelopeCache {
    store: Arc<dyn KeyValueStore>,
    key: String,
    ttl: Duration,
}

impl EnvelopeCache {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            key: key.into(),
            ttl,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, age_ms: i64) -> bool {
        i128::from(age_ms) < self.ttl.as_millis() as i128
    }

    /// Read the envelope and judge it against `now_ms`
    ///
    /// A payload that does not parse as `{data: [...], timestamp: n}` is
    /// reported as an error so callers can decide to ignore it.
    pub fn load<T: DeserializeOwned>(&self, now_ms: i64) -> Result<CacheLookup<T>> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(CacheLookup::Missing);
        };

        let envelope: CacheEnvelope<T> = serde_json::from_str(&raw)?;
        let age_ms = now_ms.saturating_sub(envelope.timestamp);

        if self.is_fresh(age_ms) {
            debug!("Cache entry '{}' is {}ms old, using it", self.key, age_ms);
            Ok(CacheLookup::Fresh(envelope.data))
        } else {
            debug!("Cache entry '{}' is stale ({}ms old)", self.key, age_ms);
            Ok(CacheLookup::Stale { age_ms })
        }
    }

    /// Overwrite the envelope with `data` captured at `now_ms`
    pub fn save<T: Serialize>(&self, data: &[T], now_ms: i64) -> Result<()> {
        #[derive(Serialize)]
        struct EnvelopeRef<'a, T> {
            data: &'a [T],
            timestamp: i64,
        }

        let raw = serde_json::to_string(&EnvelopeRef {
            data,
            timestamp: now_ms,
        })?;
        self.store.set(&self.key, &raw)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(&self.key)
    }

    pub fn inspect(&self, now_ms: i64) -> Result<Option<EnvelopeInfo>> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(None);
        };

        let envelope: CacheEnvelope<serde_json::Value> = serde_json::from_str(&raw)?;
        let age_ms = now_ms.saturating_sub(envelope.timestamp);

        Ok(Some(EnvelopeInfo {
            entries: envelope.data.len(),
            timestamp: envelope.timestamp,
            age_ms,
            fresh: self.is_fresh(age_ms),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CacheError, MemoryStore};

    const TEN_MINUTES: Duration = Duration::from_secs(600);
    const NOW: i64 = 1_700_000_000_000;

    fn cache() -> (Arc<MemoryStore>, EnvelopeCache) {
        let store = Arc::new(MemoryStore::new());
        let cache = EnvelopeCache::new(store.clone(), "blogs_cache_v1", TEN_MINUTES);
        (store, cache)
    }

    #[test]
    fn test_fresh_envelope_returns_data() {
        let (_, cache) = cache();
        cache.save(&["a".to_string(), "b".to_string()], NOW).unwrap();

        let lookup = cache.load::<String>(NOW + 9 * 60 * 1000).unwrap();
        assert_eq!(lookup, CacheLookup::Fresh(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_envelope_expires_at_ten_minutes() {
        let (_, cache) = cache();
        cache.save(&[1, 2, 3], NOW).unwrap();

        let lookup = cache.load::<i32>(NOW + 10 * 60 * 1000).unwrap();
        assert_eq!(lookup, CacheLookup::Stale { age_ms: 600_000 });
    }

    #[test]
    fn test_missing_envelope() {
        let (_, cache) = cache();
        assert_eq!(cache.load::<i32>(NOW).unwrap(), CacheLookup::Missing);
        assert_eq!(cache.inspect(NOW).unwrap(), None);
    }

    #[test]
    fn test_structurally_invalid_envelope_is_an_error() {
        let (store, cache) = cache();

        store.set("blogs_cache_v1", "not json").unwrap();
        assert!(matches!(cache.load::<i32>(NOW), Err(CacheError::Corrupt(_))));

        store.set("blogs_cache_v1", r#"{"data": {"a": 1}, "timestamp": 1}"#).unwrap();
        assert!(matches!(cache.load::<i32>(NOW), Err(CacheError::Corrupt(_))));

        store.set("blogs_cache_v1", r#"{"data": [1]}"#).unwrap();
        assert!(matches!(cache.load::<i32>(NOW), Err(CacheError::Corrupt(_))));
    }

    #[test]
    fn test_saved_envelope_has_data_and_timestamp() {
        let (store, cache) = cache();
        cache.save(&[7], NOW).unwrap();

        let raw = store.get("blogs_cache_v1").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!({"data": [7], "timestamp": NOW}));
    }

    #[test]
    fn test_inspect_and_clear() {
        let (_, cache) = cache();
        cache.save(&[1, 2], NOW).unwrap();

        let info = cache.inspect(NOW + 1000).unwrap().unwrap();
        assert_eq!(info.entries, 2);
        assert_eq!(info.age_ms, 1000);
        assert!(info.fresh);

        cache.clear().unwrap();
        assert_eq!(cache.load::<i32>(NOW).unwrap(), CacheLookup::Missing);
    }

    #[test]
    fn test_save_surfaces_quota_errors() {
        let store = Arc::new(MemoryStore::with_quota(16));
        let cache = EnvelopeCache::new(store, "blogs_cache_v1", TEN_MINUTES);

        let err = cache.save(&["a very long entry that will not fit"], NOW).unwrap_err();
        assert!(matches!(err, CacheError::QuotaExceeded { .. }));
    }
}
