//! Cache backend trait and entry/statistics types.
//!
//! A backend is dumb storage for snapshots: it holds entries and their
//! timestamps but makes no freshness decisions. TTL enforcement and
//! hit/miss accounting live in the read-through layer.

use ::async_trait::async_trait;
use bazar_core::{BazarResult, CatalogItem, ItemId, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One cached catalog snapshot.
///
/// Exists only inside a single cache instance; never shared across stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached item snapshot.
    pub item: CatalogItem,
    /// When the snapshot was taken from the store.
    pub cached_at: Timestamp,
    /// When the snapshot stops being served.
    pub expires_at: Timestamp,
}

impl CacheEntry {
    /// Build an entry valid for `ttl` starting at `cached_at`.
    pub fn new(item: CatalogItem, cached_at: Timestamp, ttl: Duration) -> Self {
        let expires_at = cached_at
            + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(0));
        Self {
            item,
            cached_at,
            expires_at,
        }
    }

    /// Whether the entry has outlived its TTL at the given instant.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// Whether the entry has outlived its TTL right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Cache backend trait for pluggable cache implementations.
///
/// Implementations must be thread-safe and support concurrent access.
/// They store whatever they are given; expired entries are removed by the
/// read-through layer when observed, not by the backend.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get the entry for an item, expired or not.
    async fn get(&self, id: ItemId) -> BazarResult<Option<CacheEntry>>;

    /// Store (or overwrite) the entry for an item.
    async fn put(&self, id: ItemId, entry: CacheEntry) -> BazarResult<()>;

    /// Remove the entry for an item. Returns whether an entry was present.
    /// Removing an absent key is a no-op.
    async fn remove(&self, id: ItemId) -> BazarResult<bool>;

    /// Drop every entry. Returns how many were removed.
    async fn clear(&self) -> BazarResult<u64>;

    /// Number of entries currently held (including expired ones not yet
    /// observed).
    async fn entry_count(&self) -> BazarResult<u64>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of reads served from a fresh entry.
    pub hits: u64,
    /// Number of reads that had to fetch from the store.
    pub misses: u64,
    /// Number of entries dropped because their TTL had passed.
    pub evictions: u64,
    /// Number of entries removed by explicit invalidation.
    pub invalidations: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
