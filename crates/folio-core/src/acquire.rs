// Data acquisition with a cache-first strategy
use std::sync::Arc;

use folio_api::{with_retry, RetryConfig};
use folio_cache::{CacheLookup, EnvelopeCache, SqliteStore};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{CacheConfig, Config};
use crate::models::BlogEntry;
use crate::providers::HttpSource;
use crate::source::BlogSource;
use crate::Result;

/// Gets blog entries from the cache when it is fresh, from the source otherwise
pub struct DataAcquirer {
    source: Box<dyn BlogSource>,
    cache: Option<EnvelopeCache>,
    retry: RetryConfig,
    clock: Arc<dyn Clock>,
}

impl DataAcquirer {
    pub fn new(source: Box<dyn BlogSource>) -> Self {
        Self {
            source,
            cache: None,
            retry: RetryConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// HTTP source plus, when enabled, the SQLite-backed envelope cache
    ///
    /// A cache store that cannot be opened is left out and every load goes
    /// to the source.
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = HttpSource::new(&config.source.endpoint, config.source.timeout())?;
        info!("Using blog source {}", source.endpoint());
        let mut acquirer = Self::new(Box::new(source)).with_retry((&config.retry).into());

        if config.cache.enabled {
            match open_cache(&config.cache) {
                Ok(cache) => acquirer = acquirer.with_cache(cache),
                Err(e) => warn!("Cache unavailable, continuing without it: {}", e),
            }
        }

        Ok(acquirer)
    }

    pub fn with_cache(mut self, cache: EnvelopeCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn cache(&self) -> Option<&EnvelopeCache> {
        self.cache.as_ref()
    }

    /// Fresh cache wins; otherwise fetch with retries and refresh the cache
    pub async fn acquire(&self) -> Result<Vec<BlogEntry>> {
        if let Some(entries) = self.read_cache() {
            info!("Cache hit! Using {} cached entries", entries.len());
            return Ok(entries);
        }

        info!("Fetching blog entries from source");
        let entries = with_retry(&self.retry, || self.source.fetch()).await?;

        self.write_cache(&entries);
        Ok(entries)
    }

    fn read_cache(&self) -> Option<Vec<BlogEntry>> {
        let cache = self.cache.as_ref()?;

        match cache.load::<BlogEntry>(self.clock.now_millis()) {
            Ok(CacheLookup::Fresh(entries)) => Some(entries),
            Ok(CacheLookup::Stale { age_ms }) => {
                debug!("Cache miss - entry is {}ms old", age_ms);
                None
            }
            Ok(CacheLookup::Missing) => {
                debug!("Cache miss - nothing stored");
                None
            }
            Err(e) => {
                debug!("Ignoring unreadable cache entry: {}", e);
                None
            }
        }
    }

    /// Best effort; a full or broken store never fails the load
    fn write_cache(&self, entries: &[BlogEntry]) {
        let Some(cache) = &self.cache else {
            return;
        };

        match cache.save(entries, self.clock.now_millis()) {
            Ok(()) => debug!("Cached {} entries under '{}'", entries.len(), cache.key()),
            Err(e) => warn!("Failed to cache blog entries: {}", e),
        }
    }
}

fn open_cache(config: &CacheConfig) -> Result<EnvelopeCache> {
    let store = SqliteStore::open(config.resolved_path()?)?;
    Ok(EnvelopeCache::new(
        Arc::new(store),
        config.key.clone(),
        config.ttl(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::source::MockBlogSource;
    use folio_api::ApiError;
    use folio_cache::{KeyValueStore, MemoryStore};
    use std::time::Duration;
    use tokio::time::Instant;

    const NOW: i64 = 1_700_000_000_000;
    const KEY: &str = "blogs_cache_v1";

    fn entries(titles: &[&str]) -> Vec<BlogEntry> {
        titles
            .iter()
            .map(|t| BlogEntry {
                title: Some(t.to_string()),
                ..Default::default()
            })
            .collect()
    }

    fn envelope_cache(store: Arc<MemoryStore>) -> EnvelopeCache {
        EnvelopeCache::new(store, KEY, Duration::from_secs(600))
    }

    fn acquirer(source: MockBlogSource, store: Arc<MemoryStore>, clock: Arc<ManualClock>) -> DataAcquirer {
        DataAcquirer::new(Box::new(source))
            .with_cache(envelope_cache(store))
            .with_clock(clock)
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_network() {
        let store = Arc::new(MemoryStore::new());
        let cached = entries(&["one", "two", "three"]);
        envelope_cache(store.clone()).save(&cached, NOW).unwrap();

        let mut source = MockBlogSource::new();
        source.expect_fetch().never();

        let clock = Arc::new(ManualClock::new(NOW + 9 * 60 * 1000));
        let result = acquirer(source, store, clock).acquire().await.unwrap();

        assert_eq!(result, cached);
    }

    #[tokio::test]
    async fn test_stale_cache_fetches_and_refreshes() {
        let store = Arc::new(MemoryStore::new());
        envelope_cache(store.clone()).save(&entries(&["old"]), NOW).unwrap();

        let mut source = MockBlogSource::new();
        source
            .expect_fetch()
            .times(1)
            .returning(|| Ok(entries(&["new"])));

        let later = NOW + 11 * 60 * 1000;
        let clock = Arc::new(ManualClock::new(later));
        let result = acquirer(source, store.clone(), clock).acquire().await.unwrap();

        assert_eq!(result, entries(&["new"]));
        assert_eq!(
            envelope_cache(store).load::<BlogEntry>(later).unwrap(),
            CacheLookup::Fresh(entries(&["new"]))
        );
    }

    #[tokio::test]
    async fn test_missing_or_corrupt_cache_fetches() {
        for stored in [None, Some("{\"data\": \"nope\"}"), Some("garbage")] {
            let store = Arc::new(MemoryStore::new());
            if let Some(raw) = stored {
                store.set(KEY, raw).unwrap();
            }

            let mut source = MockBlogSource::new();
            source
                .expect_fetch()
                .times(1)
                .returning(|| Ok(entries(&["fetched"])));

            let clock = Arc::new(ManualClock::new(NOW));
            let result = acquirer(source, store, clock).acquire().await.unwrap();
            assert_eq!(result, entries(&["fetched"]));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_backs_off_then_returns_third_attempt() {
        let mut source = MockBlogSource::new();
        let mut calls = 0;
        source.expect_fetch().times(3).returning(move || {
            calls += 1;
            if calls < 3 {
                Err(ApiError::Status { status: 500 + calls }.into())
            } else {
                Ok(entries(&["third time lucky"]))
            }
        });

        let started = Instant::now();
        let result = DataAcquirer::new(Box::new(source)).acquire().await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(300 + 600));
        assert_eq!(result, entries(&["third time lucky"]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_three_attempts() {
        let mut source = MockBlogSource::new();
        let mut calls = 0;
        source.expect_fetch().times(3).returning(move || {
            calls += 1;
            Err(ApiError::Status { status: 500 + calls }.into())
        });

        let err = DataAcquirer::new(Box::new(source)).acquire().await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! status: 503");
    }

    #[tokio::test]
    async fn test_cache_write_failure_is_swallowed() {
        let store = Arc::new(MemoryStore::with_quota(8));

        let mut source = MockBlogSource::new();
        source
            .expect_fetch()
            .times(1)
            .returning(|| Ok(entries(&["too big for the store"])));

        let clock = Arc::new(ManualClock::new(NOW));
        let result = acquirer(source, store.clone(), clock).acquire().await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(store.get(KEY).unwrap(), None);
    }

    #[test]
    fn test_unusable_cache_path_falls_back_to_source_only() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let mut config = Config::default();
        config.cache.path = Some(blocker.join("folio").join("cache.db"));

        let acquirer = DataAcquirer::from_config(&config).unwrap();
        assert!(acquirer.cache().is_none());
    }

    #[test]
    fn test_cache_opens_at_configured_path() {
        let dir = tempfile::TempDir::new().unwrap();

        let mut config = Config::default();
        config.cache.path = Some(dir.path().join("cache.db"));

        let acquirer = DataAcquirer::from_config(&config).unwrap();
        assert_eq!(acquirer.cache().map(|c| c.key()), Some("blogs_cache_v1"));
    }
}
