//! Read results carrying provenance metadata.
//!
//! Every read that goes through the cache is wrapped in a `CacheRead` so
//! callers always know whether they got a cached snapshot or a fresh store
//! row, and how old the snapshot is.

use bazar_core::{CatalogItem, ReadSource, Timestamp};
use chrono::Utc;
use std::time::Duration;

use super::backend::CacheEntry;

/// A catalog read tagged with where it was served from.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRead {
    /// The item that was read.
    pub item: CatalogItem,
    /// When the underlying snapshot was taken from the store.
    pub cached_at: Timestamp,
    /// Where the read was served from (`cache` or `store` here; the
    /// service layer additionally produces `replica` on failover).
    pub source: ReadSource,
}

impl CacheRead {
    /// Wrap a fresh cache hit.
    pub fn from_cache(entry: CacheEntry) -> Self {
        Self {
            item: entry.item,
            cached_at: entry.cached_at,
            source: ReadSource::Cache,
        }
    }

    /// Wrap a value just fetched from the store.
    pub fn from_store(item: CatalogItem, cached_at: Timestamp) -> Self {
        Self {
            item,
            cached_at,
            source: ReadSource::Store,
        }
    }

    /// How old the snapshot is right now.
    pub fn staleness(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.cached_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Whether the read was served from the cache.
    pub fn was_cache_hit(&self) -> bool {
        self.source == ReadSource::Cache
    }

    /// Whether the read had to go to the store.
    pub fn was_cache_miss(&self) -> bool {
        self.source == ReadSource::Store
    }

    /// Unwrap into the item, discarding provenance.
    pub fn into_item(self) -> CatalogItem {
        self.item
    }
}
