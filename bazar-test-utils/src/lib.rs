//! Bazar Test Utilities
//!
//! Centralized test infrastructure for the Bazar workspace:
//! - A fault-injecting `StockStore` wrapper for failure-path tests
//! - Proptest generators for catalog data
//! - Test fixtures for common inventory scenarios
//! - Custom assertions for the Bazar error taxonomy

// Re-export the real store and the seed catalog; most tests start from these
pub use bazar_storage::{seed_catalog, starter_catalog, MemoryStockStore};

// Re-export core types for convenience
pub use bazar_core::{
    BazarError, BazarResult, CatalogItem, CatalogSummary, ItemId, StoreError, ValidationError,
};

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use async_trait::async_trait;
use bazar_storage::StockStore;

// ============================================================================
// FAULT-INJECTING STORE
// ============================================================================

/// A `StockStore` that wraps a real [`MemoryStockStore`] and injects
/// failures on demand.
///
/// Reads and writes fail independently, either through a standing toggle
/// or a one-shot budget (`fail_next_writes`). The one-shot form is how
/// retry paths get exercised: arm one failure, watch the second attempt
/// land. Injected failures are always `StoreError::Unavailable`, i.e.
/// transient, so the caller's retry and failover classification kicks in.
///
/// Call counters count attempts, including injected failures.
#[derive(Debug)]
pub struct FlakyStockStore {
    inner: MemoryStockStore,
    read_failures: AtomicBool,
    write_failures: AtomicBool,
    write_failure_budget: AtomicU32,
    /// `get` attempts.
    pub get_calls: AtomicU64,
    /// `compare_and_decrement` attempts.
    pub decrement_calls: AtomicU64,
    /// `set_count` attempts.
    pub set_count_calls: AtomicU64,
}

impl FlakyStockStore {
    /// Wrap an existing store. No failures are armed initially.
    pub fn new(inner: MemoryStockStore) -> Self {
        Self {
            inner,
            read_failures: AtomicBool::new(false),
            write_failures: AtomicBool::new(false),
            write_failure_budget: AtomicU32::new(0),
            get_calls: AtomicU64::new(0),
            decrement_calls: AtomicU64::new(0),
            set_count_calls: AtomicU64::new(0),
        }
    }

    /// Wrap a store pre-populated with the seed catalog.
    pub fn seeded() -> Self {
        Self::new(MemoryStockStore::with_items(starter_catalog()))
    }

    /// Arm or clear the standing read-failure toggle. Covers `get`,
    /// `search_by_topic`, and `ping`.
    pub fn fail_reads(&self, fail: bool) {
        self.read_failures.store(fail, Ordering::SeqCst);
    }

    /// Arm or clear the standing write-failure toggle. Covers
    /// `compare_and_decrement`, `set_count`, and `insert`.
    pub fn fail_writes(&self, fail: bool) {
        self.write_failures.store(fail, Ordering::SeqCst);
    }

    /// Fail exactly the next `count` writes, then recover. The one-shot
    /// budget is consumed before the standing toggle is consulted.
    pub fn fail_next_writes(&self, count: u32) {
        self.write_failure_budget.store(count, Ordering::SeqCst);
    }

    fn injected_read_failure(&self) -> Option<BazarError> {
        self.read_failures.load(Ordering::SeqCst).then(|| {
            StoreError::Unavailable {
                reason: "injected read failure".to_string(),
            }
            .into()
        })
    }

    fn injected_write_failure(&self) -> Option<BazarError> {
        let one_shot = self
            .write_failure_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        (one_shot || self.write_failures.load(Ordering::SeqCst)).then(|| {
            StoreError::Unavailable {
                reason: "injected write failure".to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl StockStore for FlakyStockStore {
    async fn get(&self, id: ItemId) -> BazarResult<Option<CatalogItem>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.injected_read_failure() {
            return Err(err);
        }
        self.inner.get(id).await
    }

    async fn search_by_topic(&self, topic: &str) -> BazarResult<Vec<CatalogSummary>> {
        if let Some(err) = self.injected_read_failure() {
            return Err(err);
        }
        self.inner.search_by_topic(topic).await
    }

    async fn compare_and_decrement(&self, id: ItemId, delta: i64) -> BazarResult<i64> {
        self.decrement_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.injected_write_failure() {
            return Err(err);
        }
        self.inner.compare_and_decrement(id, delta).await
    }

    async fn set_count(&self, id: ItemId, count: i64) -> BazarResult<i64> {
        self.set_count_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.injected_write_failure() {
            return Err(err);
        }
        self.inner.set_count(id, count).await
    }

    async fn insert(&self, item: CatalogItem) -> BazarResult<bool> {
        if let Some(err) = self.injected_write_failure() {
            return Err(err);
        }
        self.inner.insert(item).await
    }

    async fn ping(&self) -> BazarResult<()> {
        if let Some(err) = self.injected_read_failure() {
            return Err(err);
        }
        self.inner.ping().await
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating catalog data.

    use super::*;
    use bazar_core::Timestamp;
    use chrono::Utc;
    use proptest::prelude::*;

    /// Generate an item id in the range real catalogs use.
    pub fn arb_item_id() -> impl Strategy<Value = ItemId> {
        1u32..=500
    }

    /// Generate a plausible item name.
    pub fn arb_item_name() -> impl Strategy<Value = String> {
        "[A-Z][a-z]{2,12}( [a-z]{2,12}){0,3}"
    }

    /// Generate a topic, biased toward the seeded ones so searches overlap.
    pub fn arb_topic() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("distributed systems".to_string()),
            Just("undergraduate school".to_string()),
            Just("operating systems".to_string()),
            "[a-z]{3,10}( [a-z]{3,10})?",
        ]
    }

    /// Generate a non-negative stock count.
    pub fn arb_count() -> impl Strategy<Value = i64> {
        0i64..=10_000
    }

    /// Generate a strictly positive cost with two decimal places.
    pub fn arb_cost() -> impl Strategy<Value = f64> {
        (1u32..=50_000).prop_map(|cents| f64::from(cents) / 100.0)
    }

    /// Generate a bookkeeping timestamp within a plausible range (2020-2030).
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64)
            .prop_map(|secs| chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now))
    }

    /// Generate a full catalog item satisfying the count and cost invariants.
    pub fn arb_catalog_item() -> impl Strategy<Value = CatalogItem> {
        (
            arb_item_id(),
            arb_item_name(),
            arb_topic(),
            arb_count(),
            arb_cost(),
            arb_timestamp(),
            arb_timestamp(),
        )
            .prop_map(|(id, name, topic, count, cost, a, b)| CatalogItem {
                id,
                name,
                topic,
                count,
                cost,
                created_at: a.min(b),
                updated_at: a.max(b),
            })
    }

    /// Generate a small catalog with distinct item ids, sorted by id.
    pub fn arb_catalog(max_items: usize) -> impl Strategy<Value = Vec<CatalogItem>> {
        prop::collection::hash_map(
            arb_item_id(),
            (arb_item_name(), arb_topic(), arb_count(), arb_cost()),
            1..=max_items,
        )
        .prop_map(|entries| {
            let mut items: Vec<CatalogItem> = entries
                .into_iter()
                .map(|(id, (name, topic, count, cost))| {
                    CatalogItem::new(id, name, topic, count, cost)
                })
                .collect();
            items.sort_by_key(|item| item.id);
            items
        })
    }

    /// Generate a signed count delta in the range the service sees: small
    /// purchases (negative) and restocks (positive).
    pub fn arb_delta() -> impl Strategy<Value = i64> {
        -5i64..=5
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common inventory scenarios.

    use super::*;

    /// Create a generic in-stock item for tests that only care about counts.
    pub fn item(id: ItemId, count: i64) -> CatalogItem {
        CatalogItem::new(id, format!("Test Book {id}"), "testing", count, 10.0)
    }

    /// Create an item with zero stock.
    pub fn sold_out(id: ItemId) -> CatalogItem {
        item(id, 0)
    }

    /// Create a store pre-populated with the seed catalog.
    pub fn seeded_store() -> MemoryStockStore {
        MemoryStockStore::with_items(starter_catalog())
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertions for the Bazar error taxonomy.

    use super::*;

    /// Assert that a result is the `NotFound` rejection for the given id.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &BazarResult<T>, id: ItemId) {
        match result {
            Err(BazarError::Store(StoreError::NotFound { id: got })) => {
                assert_eq!(*got, id, "wrong id in NotFound error");
            }
            other => panic!("Expected NotFound for {id}, got: {other:?}"),
        }
    }

    /// Assert that a result is the `InsufficientStock` rejection.
    #[track_caller]
    pub fn assert_insufficient_stock<T: std::fmt::Debug>(result: &BazarResult<T>) {
        match result {
            Err(e) if e.is_insufficient_stock() => {}
            other => panic!("Expected InsufficientStock, got: {other:?}"),
        }
    }

    /// Assert that a result failed with a transient error, i.e. one the
    /// retry and failover paths would act on.
    #[track_caller]
    pub fn assert_transient<T: std::fmt::Debug>(result: &BazarResult<T>) {
        match result {
            Err(e) if e.is_transient() => {}
            other => panic!("Expected a transient failure, got: {other:?}"),
        }
    }

    /// Assert that a result is a `Validation` rejection.
    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &BazarResult<T>) {
        match result {
            Err(BazarError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {other:?}"),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
