//! Bazar Storage - Stock Store Trait, Backends and TTL Cache
//!
//! Defines the durable-storage abstraction for catalog stock counters and
//! the per-process TTL cache that fronts it. Two `StockStore` backends
//! ship here: an in-memory map for tests and single-process use, and an
//! LMDB store for durable deployments.

pub mod cache;
pub mod lmdb;
pub mod memory;
pub mod seed;
pub mod store;

pub use store::StockStore;

pub use lmdb::{LmdbStockStore, LmdbStoreError};
pub use memory::MemoryStockStore;
pub use seed::{seed_catalog, starter_catalog};

// Re-export cache types for service integration
pub use cache::{
    CacheBackend, CacheConfig, CacheEntry, CacheLayer, CacheRead, CacheStats,
    InMemoryCacheBackend, DEFAULT_TTL,
};
