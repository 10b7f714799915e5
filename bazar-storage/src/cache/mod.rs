//! TTL cache layer for catalog reads.
//!
//! A read-through cache with a fixed TTL and explicit invalidation, sitting
//! in front of one `StockStore` instance.
//!
//! # Design Philosophy
//!
//! Traditional caches hide their staleness, leading to subtle bugs. This
//! module makes provenance explicit: every read returns a [`CacheRead`]
//! tagged with its source and snapshot time, so callers can always tell a
//! cached value from a fresh store row.
//!
//! The staleness contract is deliberate: a cache never serves data older
//! than its TTL *unless* the store was mutated out-of-band without an
//! invalidation call. That window is bounded by the TTL and accepted.
//!
//! # Example
//!
//! ```ignore
//! let cache = CacheLayer::with_defaults(Arc::new(InMemoryCacheBackend::new()));
//!
//! let read = cache.get(id, store.as_ref()).await?;
//! if read.staleness() > Duration::from_secs(30) {
//!     tracing::warn!(item_id = id, "Serving an aging snapshot");
//! }
//!
//! // After any write to the same id:
//! cache.invalidate(id).await?;
//! ```

pub mod backend;
pub mod memory;
pub mod read;
pub mod read_through;

pub use backend::{CacheBackend, CacheEntry, CacheStats};
pub use memory::InMemoryCacheBackend;
pub use read::CacheRead;
pub use read_through::{CacheConfig, CacheLayer, DEFAULT_TTL};
