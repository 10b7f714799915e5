//! BAZAR Service - Inventory Consistency Layer
//!
//! This crate wires the storage layer into a purchasable inventory: a
//! cache-fronted facade over the stock store, a purchase coordinator that
//! walks every attempt through an explicit state machine, and an optional
//! replica link for read failover and best-effort count propagation.
//!
//! Commits only ever happen against the primary store. The replica serves
//! reads when the primary is down and receives post-commit counts
//! asynchronously; its health is tracked from real traffic.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod health;
pub mod inventory;
pub mod metrics;
pub mod replica;
pub mod telemetry;

// Re-export commonly used types
pub use config::ServiceConfig;
pub use coordinator::{PurchaseCoordinator, PurchaseReceipt, PurchaseState};
pub use error::{ErrorCode, ErrorEnvelope};
pub use health::{check_health, HealthReport};
pub use inventory::{InventoryService, ItemInfo, SetCountOutcome};
pub use metrics::{PurchaseMetrics, PurchaseMetricsSnapshot};
pub use replica::{HttpReplicaLink, ReplicaAck, ReplicaHandle, ReplicaLink};
pub use telemetry::init_tracing;
