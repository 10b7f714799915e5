//! In-memory stock store.
//!
//! Backs tests and single-process deployments. The write half of the
//! `tokio::sync::RwLock` serializes every mutation, which more than covers
//! the per-item serialization the compare-and-decrement contract requires.

use std::collections::HashMap;

use ::async_trait::async_trait;
use bazar_core::{
    BazarResult, CatalogItem, CatalogSummary, ItemId, StoreError, ValidationError,
};
use chrono::Utc;
use tokio::sync::RwLock;

use crate::store::StockStore;

/// In-memory `StockStore` over a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStockStore {
    items: RwLock<HashMap<ItemId, CatalogItem>>,
}

impl MemoryStockStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given items.
    pub fn with_items(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        let map = items.into_iter().map(|i| (i.id, i)).collect();
        Self {
            items: RwLock::new(map),
        }
    }

    /// Number of items currently stored.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Whether the store holds no items.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl StockStore for MemoryStockStore {
    async fn get(&self, id: ItemId) -> BazarResult<Option<CatalogItem>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn search_by_topic(&self, topic: &str) -> BazarResult<Vec<CatalogSummary>> {
        let items = self.items.read().await;
        let needle = topic.to_lowercase();
        let mut matches: Vec<CatalogSummary> = items
            .values()
            .filter(|item| item.topic.to_lowercase() == needle)
            .map(CatalogItem::summary)
            .collect();
        matches.sort_by_key(|s| s.id);
        Ok(matches)
    }

    async fn compare_and_decrement(&self, id: ItemId, delta: i64) -> BazarResult<i64> {
        let mut items = self.items.write().await;
        let item = items
            .get_mut(&id)
            .ok_or(StoreError::NotFound { id })?;

        let new_count = item.count + delta;
        if new_count < 0 {
            return Err(StoreError::InsufficientStock {
                id,
                available: item.count,
                requested: -delta,
            }
            .into());
        }

        item.count = new_count;
        item.updated_at = Utc::now();
        Ok(new_count)
    }

    async fn set_count(&self, id: ItemId, count: i64) -> BazarResult<i64> {
        if count < 0 {
            return Err(ValidationError::InvalidCount { count }.into());
        }

        let mut items = self.items.write().await;
        let item = items
            .get_mut(&id)
            .ok_or(StoreError::NotFound { id })?;

        let previous = item.count;
        item.count = count;
        item.updated_at = Utc::now();
        Ok(previous)
    }

    async fn insert(&self, item: CatalogItem) -> BazarResult<bool> {
        let mut items = self.items.write().await;
        if items.contains_key(&item.id) {
            return Ok(false);
        }
        items.insert(item.id, item);
        Ok(true)
    }

    async fn ping(&self) -> BazarResult<()> {
        let _ = self.items.read().await;
        Ok(())
    }
}


// =============================================================================
// PROPERTY-BASED TESTS
// =============================================================================
