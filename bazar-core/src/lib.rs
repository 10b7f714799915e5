//! Bazar Core - Inventory Data Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types - no storage, no I/O, no async.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;
pub mod health;

pub use error::{
    BazarError, BazarResult, ConfigError, ReplicaError, StoreError, ValidationError,
};
pub use health::{ComponentHealth, HealthStatus};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Catalog item identifier. The catalog is small and seeded with fixed
/// integer ids, so this stays a plain integer rather than a UUID.
pub type ItemId = u32;

/// Purchase attempt identifier using UUIDv7 for timestamp-sortable IDs.
/// Used to correlate log lines and receipts, never persisted by the store.
pub type PurchaseId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 PurchaseId (timestamp-sortable).
pub fn new_purchase_id() -> PurchaseId {
    Uuid::now_v7()
}

// ============================================================================
// CATALOG TYPES
// ============================================================================

/// The stock record for one inventory entry.
///
/// Invariants:
/// - `count >= 0` at all times; every mutation is a delta applied only if
///   the result stays non-negative.
/// - `cost > 0`.
///
/// `updated_at` is a last-modified marker maintained by the store on every
/// mutation. It feeds the health surface and log lines only; no consistency
/// decision reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    pub topic: String,
    pub count: i64,
    pub cost: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CatalogItem {
    /// Create an item with both bookkeeping timestamps set to now.
    pub fn new(id: ItemId, name: impl Into<String>, topic: impl Into<String>, count: i64, cost: f64) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            topic: topic.into(),
            count,
            cost,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether at least one unit can be sold.
    pub fn in_stock(&self) -> bool {
        self.count > 0
    }

    /// Projection used by purchase receipts.
    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            name: self.name.clone(),
            cost: self.cost,
        }
    }

    /// Projection used by topic search results.
    pub fn summary(&self) -> CatalogSummary {
        CatalogSummary {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Search projection: just enough to list matches by topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub id: ItemId,
    pub name: String,
}

/// Receipt projection: the purchased item without its live count.
/// The post-purchase count travels separately as `remaining_stock`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub name: String,
    pub cost: f64,
}

// ============================================================================
// READ PROVENANCE
// ============================================================================

/// Where a successful read was served from.
///
/// Every read that leaves the inventory layer is tagged with its source so
/// callers can tell a fresh store read from a cached snapshot or a failover
/// read against the replica (which is allowed to be stale).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadSource {
    Cache,
    Store,
    Replica,
}

impl std::fmt::Display for ReadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadSource::Cache => write!(f, "cache"),
            ReadSource::Store => write!(f, "store"),
            ReadSource::Replica => write!(f, "replica"),
        }
    }
}

/// Role of a store endpoint in the primary/replica pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreRole {
    /// Sole commit target; authoritative for counts.
    Primary,
    /// Read-failover target and best-effort propagation sink.
    Replica,
}

// =============================================================================
// TESTS
// =============================================================================


// =============================================================================
// PROPERTY-BASED TESTS
// =============================================================================
