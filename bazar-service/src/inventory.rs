//! Inventory facade over one stock store and its cache
//!
//! Reads go through the cache; writes go straight to the store and then
//! unconditionally invalidate the cached entry. The invalidation happens
//! whether or not the write succeeded: after a failed write the cached
//! entry may still describe pre-write state, and dropping it costs one
//! refetch.
//!
//! The facade takes no locks of its own. Per-item write ordering comes
//! entirely from the store's transaction boundary.

use bazar_core::{
    BazarResult, CatalogItem, CatalogSummary, ItemId, ReadSource, Timestamp, ValidationError,
};
use bazar_storage::{CacheBackend, CacheLayer, CacheRead, CacheStats, StockStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// READ / WRITE RESULT TYPES
// ============================================================================

/// A catalog read plus its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInfo {
    /// The item as read.
    pub item: CatalogItem,
    /// Where the read was served from.
    pub source: ReadSource,
    /// When the underlying snapshot was taken.
    pub cached_at: Timestamp,
}

impl From<CacheRead> for ItemInfo {
    fn from(read: CacheRead) -> Self {
        Self {
            item: read.item,
            source: read.source,
            cached_at: read.cached_at,
        }
    }
}

/// Result of an absolute count write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCountOutcome {
    /// The count the store held before the write.
    pub previous: i64,
    /// The count the store holds now.
    pub current: i64,
}

// ============================================================================
// INVENTORY SERVICE
// ============================================================================

/// Facade combining a stock store with its read-through cache.
///
/// # Usage
///
/// ```ignore
/// let info = inventory.get_info(1).await?;          // cache-first read
/// let count = inventory.update_count(1, -1).await?; // write + invalidate
/// ```
pub struct InventoryService<B: CacheBackend> {
    /// The authoritative stock store.
    store: Arc<dyn StockStore>,
    /// The read-through cache in front of it.
    cache: CacheLayer<B>,
}

impl<B: CacheBackend> InventoryService<B> {
    /// Create a new inventory service.
    pub fn new(store: Arc<dyn StockStore>, cache: CacheLayer<B>) -> Self {
        Self { store, cache }
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &dyn StockStore {
        self.store.as_ref()
    }

    /// Get a reference to the cache layer.
    pub fn cache(&self) -> &CacheLayer<B> {
        &self.cache
    }

    // ========================================================================
    // READ OPERATIONS
    // ========================================================================

    /// Get an item by id, checking the cache first.
    ///
    /// The result states whether it came from the cache or the store; a
    /// cached result may be up to the configured TTL out of date.
    pub async fn get_info(&self, id: ItemId) -> BazarResult<ItemInfo> {
        let read = self.cache.get(id, self.store.as_ref()).await?;
        Ok(ItemInfo::from(read))
    }

    /// Find items by topic (not cached; exact, case-insensitive match).
    pub async fn search(&self, topic: &str) -> BazarResult<Vec<CatalogSummary>> {
        self.store.search_by_topic(topic).await
    }

    // ========================================================================
    // WRITE OPERATIONS
    // ========================================================================

    /// Apply a signed delta to an item's count and return the new count.
    ///
    /// Rejects a zero delta before touching the store. The cached entry for
    /// the item is invalidated whether or not the write succeeded.
    pub async fn update_count(&self, id: ItemId, delta: i64) -> BazarResult<i64> {
        if delta == 0 {
            return Err(ValidationError::InvalidValue {
                field: "delta".to_string(),
                reason: "a zero delta would be a no-op write".to_string(),
            }
            .into());
        }

        let result = self.store.compare_and_decrement(id, delta).await;
        self.invalidate_after_write(id).await;
        result
    }

    /// Write an absolute count (the replica-propagation target).
    ///
    /// Rejects negative targets before touching the store. Returns both the
    /// previous and the new count; the previous count is what divergence
    /// detection compares against.
    pub async fn set_count(&self, id: ItemId, count: i64) -> BazarResult<SetCountOutcome> {
        if count < 0 {
            return Err(ValidationError::InvalidCount { count }.into());
        }

        let result = self.store.set_count(id, count).await;
        self.invalidate_after_write(id).await;
        let previous = result?;
        Ok(SetCountOutcome {
            previous,
            current: count,
        })
    }

    /// Drop the cached entry after a write attempt.
    ///
    /// The write outcome is authoritative; a failed invalidation is logged
    /// and swallowed so it cannot turn a committed write into an error.
    async fn invalidate_after_write(&self, id: ItemId) {
        if let Err(e) = self.cache.invalidate(id).await {
            tracing::warn!(item_id = id, error = %e, "Cache invalidation failed after write");
        }
    }

    // ========================================================================
    // MAINTENANCE OPERATIONS
    // ========================================================================

    /// Force-clear the cached entry for an item.
    ///
    /// Returns whether an entry was actually removed. Invalidating an
    /// absent entry is a no-op, so calling this twice is harmless.
    pub async fn invalidate(&self, id: ItemId) -> BazarResult<bool> {
        self.cache.invalidate(id).await
    }

    /// Current cache counters, for the health surface.
    pub async fn cache_stats(&self) -> BazarResult<CacheStats> {
        self.cache.stats().await
    }

    /// Probe store connectivity.
    pub async fn ping_store(&self) -> BazarResult<()> {
        self.store.ping().await
    }
}

impl<B: CacheBackend> Clone for InventoryService<B> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: self.cache.clone(),
        }
    }
}
