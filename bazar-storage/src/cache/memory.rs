//! In-memory cache backend.
//!
//! The default backend for a per-process cache: a plain map guarded by a
//! `tokio::sync::RwLock`. Catalog snapshots are small and the catalog
//! itself is tiny, so there is no capacity bound.

use std::collections::HashMap;

use ::async_trait::async_trait;
use bazar_core::{BazarResult, ItemId};
use tokio::sync::RwLock;

use super::backend::{CacheBackend, CacheEntry};

/// In-memory `CacheBackend` over a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryCacheBackend {
    entries: RwLock<HashMap<ItemId, CacheEntry>>,
}

impl InMemoryCacheBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, id: ItemId) -> BazarResult<Option<CacheEntry>> {
        Ok(self.entries.read().await.get(&id).cloned())
    }

    async fn put(&self, id: ItemId, entry: CacheEntry) -> BazarResult<()> {
        self.entries.write().await.insert(id, entry);
        Ok(())
    }

    async fn remove(&self, id: ItemId) -> BazarResult<bool> {
        Ok(self.entries.write().await.remove(&id).is_some())
    }

    async fn clear(&self) -> BazarResult<u64> {
        let mut entries = self.entries.write().await;
        let removed = entries.len() as u64;
        entries.clear();
        Ok(removed)
    }

    async fn entry_count(&self) -> BazarResult<u64> {
        Ok(self.entries.read().await.len() as u64)
    }
}
