//! Async stock store trait for durable per-item counters.
//!
//! The store is the single source of truth for counts and the only place
//! where mutations are serialized. Everything above it (cache, service,
//! coordinator) treats the store transaction as the atomicity boundary.

use ::async_trait::async_trait;
use bazar_core::{BazarResult, CatalogItem, CatalogSummary, ItemId};

/// Async storage trait for catalog stock operations.
///
/// Implementations must serialize concurrent mutations on the same item:
/// two concurrent `compare_and_decrement` calls against a count of 1 must
/// yield exactly one success and one `InsufficientStock`, never two
/// successes.
#[async_trait]
pub trait StockStore: Send + Sync {
    // ========================================================================
    // READ OPERATIONS
    // ========================================================================

    /// Get an item by id. Returns `None` when the id is unknown.
    async fn get(&self, id: ItemId) -> BazarResult<Option<CatalogItem>>;

    /// List items whose topic matches (case-insensitive, exact).
    /// Pass-through query with no consistency machinery.
    async fn search_by_topic(&self, topic: &str) -> BazarResult<Vec<CatalogSummary>>;

    // ========================================================================
    // WRITE OPERATIONS
    // ========================================================================

    /// Apply a signed delta to an item's count, but only if the result
    /// stays non-negative. Returns the new count.
    ///
    /// Rejects with `StoreError::NotFound` for unknown ids and
    /// `StoreError::InsufficientStock` when `count + delta < 0`. Also
    /// refreshes the item's last-modified marker.
    async fn compare_and_decrement(&self, id: ItemId, delta: i64) -> BazarResult<i64>;

    /// Overwrite an item's count with an absolute value. Returns the
    /// **previous** count so callers can detect divergence.
    ///
    /// This is the replica-propagation target: the primary's resulting
    /// count is pushed here verbatim. Rejects negative targets with
    /// `ValidationError::InvalidCount`.
    async fn set_count(&self, id: ItemId, count: i64) -> BazarResult<i64>;

    /// Insert a new item. Returns `false` (leaving the stored row alone)
    /// when the id already exists, which makes seeding idempotent.
    async fn insert(&self, item: CatalogItem) -> BazarResult<bool>;

    // ========================================================================
    // MAINTENANCE
    // ========================================================================

    /// Cheap connectivity probe for the health surface.
    async fn ping(&self) -> BazarResult<()>;
}
