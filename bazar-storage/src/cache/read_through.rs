//! Read-through TTL cache in front of a stock store.
//!
//! Reads go cache-first: a fresh entry is served as-is, anything else is
//! pulled from the wrapped store and re-cached with a fixed TTL. Writes
//! never go through here; the inventory layer invalidates after every
//! store mutation instead. The one accepted hazard is an out-of-band store
//! mutation that bypasses invalidation: its staleness is bounded by the
//! TTL, which is the contract, not a bug.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bazar_core::{BazarResult, CatalogItem, ItemId, StoreError};
use chrono::Utc;

use super::backend::{CacheBackend, CacheEntry, CacheStats};
use super::read::CacheRead;
use crate::store::StockStore;

/// Default entry TTL: the 100-time-unit bound the staleness contract is
/// written against.
pub const DEFAULT_TTL: Duration = Duration::from_secs(100);

/// Configuration for the read-through cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Fixed TTL for cached entries.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl: DEFAULT_TTL }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Hit/miss/eviction counters, shared across clones of the layer.
#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    invalidations: AtomicU64,
}

/// Read-through TTL cache over a pluggable backend.
///
/// # Example
///
/// ```ignore
/// let cache = CacheLayer::with_defaults(Arc::new(InMemoryCacheBackend::new()));
///
/// let read = cache.get(item_id, store.as_ref()).await?;
/// if read.was_cache_hit() {
///     // served without touching the store
/// }
/// ```
pub struct CacheLayer<B: CacheBackend> {
    /// The cache backend.
    backend: Arc<B>,
    /// Cache configuration.
    config: CacheConfig,
    /// Usage counters.
    counters: Arc<CacheCounters>,
}

impl<B: CacheBackend> CacheLayer<B> {
    /// Create a new cache layer.
    pub fn new(backend: Arc<B>, config: CacheConfig) -> Self {
        Self {
            backend,
            config,
            counters: Arc::new(CacheCounters::default()),
        }
    }

    /// Create a new cache layer with default configuration.
    pub fn with_defaults(backend: Arc<B>) -> Self {
        Self::new(backend, CacheConfig::default())
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get a reference to the cache backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get an item, serving a fresh cached snapshot when one exists and
    /// pulling through the store otherwise.
    ///
    /// An expired entry is removed when observed and counted as an
    /// eviction; the read then proceeds as a miss. Unknown ids surface
    /// `StoreError::NotFound` and are never cached.
    pub async fn get<S>(&self, id: ItemId, store: &S) -> BazarResult<CacheRead>
    where
        S: StockStore + ?Sized,
    {
        if let Some(entry) = self.backend.get(id).await? {
            if !entry.is_expired() {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(CacheRead::from_cache(entry));
            }
            // Lazy expiry: drop the dead entry so the refetch repopulates.
            self.backend.remove(id).await?;
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        let item = store
            .get(id)
            .await?
            .ok_or(StoreError::NotFound { id })?;

        let cached_at = Utc::now();
        let entry = CacheEntry::new(item.clone(), cached_at, self.config.ttl);
        self.backend.put(id, entry).await?;

        Ok(CacheRead::from_store(item, cached_at))
    }

    /// Store a snapshot directly, restarting its TTL.
    pub async fn put(&self, item: CatalogItem) -> BazarResult<()> {
        let entry = CacheEntry::new(item.clone(), Utc::now(), self.config.ttl);
        self.backend.put(item.id, entry).await
    }

    /// Unconditionally drop the entry for an item. Idempotent: removing an
    /// absent key is a no-op and returns `false`.
    pub async fn invalidate(&self, id: ItemId) -> BazarResult<bool> {
        let removed = self.backend.remove(id).await?;
        if removed {
            self.counters.invalidations.fetch_add(1, Ordering::Relaxed);
        }
        Ok(removed)
    }

    /// Current usage statistics.
    pub async fn stats(&self) -> BazarResult<CacheStats> {
        Ok(CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            invalidations: self.counters.invalidations.load(Ordering::Relaxed),
            entry_count: self.backend.entry_count().await?,
        })
    }
}

impl<B: CacheBackend> Clone for CacheLayer<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            config: self.config.clone(),
            counters: Arc::clone(&self.counters),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::InMemoryCacheBackend;
    use crate::memory::MemoryStockStore;
    use bazar_core::ReadSource;

    fn seeded_store() -> MemoryStockStore {
        MemoryStockStore::with_items([
            CatalogItem::new(1, "RPCs for Noobs", "distributed systems", 100, 40.0),
            CatalogItem::new(
                4,
                "Cooking for the Impatient Undergrad",
                "undergraduate school",
                100,
                20.0,
            ),
        ])
    }

    fn default_layer() -> CacheLayer<InMemoryCacheBackend> {
        CacheLayer::with_defaults(Arc::new(InMemoryCacheBackend::new()))
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let store = seeded_store();
        let cache = default_layer();

        let first = cache.get(1, &store).await.expect("get should succeed");
        assert_eq!(first.source, ReadSource::Store);
        assert_eq!(first.item.count, 100);

        let second = cache.get(1, &store).await.expect("get should succeed");
        assert_eq!(second.source, ReadSource::Cache);
        // The cached snapshot is exactly what the fetch returned.
        assert_eq!(second.item, first.item);

        let stats = cache.stats().await.expect("stats should succeed");
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 1);
    }

    #[tokio::test]
    async fn test_unknown_id_not_cached() {
        let store = seeded_store();
        let cache = default_layer();

        let err = cache.get(9, &store).await.expect_err("unknown id must fail");
        assert!(err.is_not_found());

        let stats = cache.stats().await.expect("stats should succeed");
        assert_eq!(stats.entry_count, 0, "absence must not be cached");
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_evicted_and_refetched() {
        let store = seeded_store();
        let cache = CacheLayer::new(
            Arc::new(InMemoryCacheBackend::new()),
            CacheConfig::new().with_ttl(Duration::ZERO),
        );

        let first = cache.get(1, &store).await.expect("get should succeed");
        assert_eq!(first.source, ReadSource::Store);

        // TTL of zero expires entries immediately, so the next read must
        // evict and refetch.
        store.set_count(1, 42).await.expect("set should succeed");
        let second = cache.get(1, &store).await.expect("get should succeed");
        assert_eq!(second.source, ReadSource::Store);
        assert_eq!(second.item.count, 42);

        let stats = cache.stats().await.expect("stats should succeed");
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.hits, 0);
    }

    #[tokio::test]
    async fn test_out_of_band_mutation_masked_until_invalidated() {
        let store = seeded_store();
        let cache = default_layer();

        let before = cache.get(1, &store).await.expect("get should succeed");
        assert_eq!(before.item.count, 100);

        // Mutate the store behind the cache's back: no invalidation call.
        store.set_count(1, 10).await.expect("set should succeed");

        // Within the TTL the cache still serves the pre-mutation snapshot.
        let masked = cache.get(1, &store).await.expect("get should succeed");
        assert_eq!(masked.source, ReadSource::Cache);
        assert_eq!(masked.item.count, 100);

        // An explicit invalidation lifts the mask.
        assert!(cache.invalidate(1).await.expect("invalidate should succeed"));
        let after = cache.get(1, &store).await.expect("get should succeed");
        assert_eq!(after.source, ReadSource::Store);
        assert_eq!(after.item.count, 10);
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let store = seeded_store();
        let cache = default_layer();

        cache.get(1, &store).await.expect("get should succeed");

        assert!(cache.invalidate(1).await.expect("invalidate should succeed"));
        assert!(!cache.invalidate(1).await.expect("invalidate should succeed"));
        // A third call observes exactly what the second did.
        assert!(!cache.invalidate(1).await.expect("invalidate should succeed"));

        let read = cache.get(1, &store).await.expect("get should succeed");
        assert_eq!(read.source, ReadSource::Store);

        let stats = cache.stats().await.expect("stats should succeed");
        assert_eq!(stats.invalidations, 1, "no-op invalidations are not counted");
    }

    #[tokio::test]
    async fn test_put_warms_the_cache() {
        let store = seeded_store();
        let cache = default_layer();

        let item = store
            .get(4)
            .await
            .expect("get should succeed")
            .expect("item should exist");
        cache.put(item).await.expect("put should succeed");

        let read = cache.get(4, &store).await.expect("get should succeed");
        assert_eq!(read.source, ReadSource::Cache);

        let stats = cache.stats().await.expect("stats should succeed");
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test]
    async fn test_clones_share_counters() {
        let store = seeded_store();
        let cache = default_layer();
        let clone = cache.clone();

        cache.get(1, &store).await.expect("get should succeed");
        clone.get(1, &store).await.expect("get should succeed");

        let stats = cache.stats().await.expect("stats should succeed");
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_cache_config_builder() {
        let config = CacheConfig::new().with_ttl(Duration::from_secs(30));
        assert_eq!(config.ttl, Duration::from_secs(30));
        assert_eq!(CacheConfig::default().ttl, DEFAULT_TTL);
    }
}
