//! Replica link: read failover target and best-effort propagation sink
//!
//! The replica is a second, network-reachable inventory service holding the
//! same catalog. It serves reads when the primary is unreachable (results
//! are allowed to be stale) and receives the primary's resulting count after
//! each successful purchase. It never takes commits.
//!
//! `ReplicaHandle` tracks the link's recent behavior. Its verdict is an
//! optimization hint for the health surface, never a source of truth: a
//! degraded replica is still tried on failover.

pub mod http;

pub use http::HttpReplicaLink;

use async_trait::async_trait;
use bazar_core::{BazarError, BazarResult, CatalogItem, ComponentHealth, ItemId, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

// ============================================================================
// REPLICA LINK TRAIT
// ============================================================================

/// Acknowledgement returned by the replica for a propagated count.
///
/// Shape matches what a replica running this software returns from its own
/// absolute count write: the count it held before, and the count it holds
/// now. The `previous` field is what divergence detection compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaAck {
    /// The count the replica held before the propagation.
    pub previous: i64,
    /// The count the replica holds now.
    pub current: i64,
}

/// Client-side view of the replica inventory service.
#[async_trait]
pub trait ReplicaLink: Send + Sync {
    /// The replica's endpoint, for log lines and error messages.
    fn endpoint(&self) -> &str;

    /// Read an item from the replica. May return stale data.
    async fn get_info(&self, id: ItemId) -> BazarResult<CatalogItem>;

    /// Drive the replica's count for an item to an absolute value.
    async fn propagate_count(&self, id: ItemId, count: i64) -> BazarResult<ReplicaAck>;

    /// Probe replica connectivity.
    async fn ping(&self) -> BazarResult<()>;
}

// ============================================================================
// REPLICA HANDLE
// ============================================================================

#[derive(Debug, Clone, Default)]
struct ReplicaState {
    last_ok_at: Option<Timestamp>,
    last_error: Option<String>,
}

/// A replica link plus its recorded recent behavior.
///
/// Failures observed during failover reads and propagation feed a
/// consecutive-failure counter; at or beyond the configured threshold the
/// handle reports degraded. Any success resets the streak.
pub struct ReplicaHandle {
    link: Arc<dyn ReplicaLink>,
    failure_threshold: u32,
    consecutive_failures: AtomicU32,
    state: RwLock<ReplicaState>,
}

impl ReplicaHandle {
    /// Wrap a link with health tracking.
    pub fn new(link: Arc<dyn ReplicaLink>, failure_threshold: u32) -> Self {
        Self {
            link,
            failure_threshold,
            consecutive_failures: AtomicU32::new(0),
            state: RwLock::new(ReplicaState::default()),
        }
    }

    /// The wrapped link.
    pub fn link(&self) -> &dyn ReplicaLink {
        self.link.as_ref()
    }

    /// The replica's endpoint.
    pub fn endpoint(&self) -> &str {
        self.link.endpoint()
    }

    /// Record a successful replica interaction, resetting the streak.
    pub async fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        let mut state = self.state.write().await;
        state.last_ok_at = Some(Utc::now());
        state.last_error = None;
    }

    /// Record a failed replica interaction. Returns the streak length.
    pub async fn record_failure(&self, error: &BazarError) -> u32 {
        let streak = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        let mut state = self.state.write().await;
        state.last_error = Some(error.to_string());
        streak
    }

    /// Current consecutive-failure streak.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// Whether the streak has reached the degradation threshold.
    pub fn is_degraded(&self) -> bool {
        self.consecutive_failures() >= self.failure_threshold
    }

    /// Health verdict from recorded behavior alone (no live probe).
    pub async fn health(&self) -> ComponentHealth {
        let failures = self.consecutive_failures();
        if failures < self.failure_threshold {
            return ComponentHealth::healthy();
        }

        let state = self.state.read().await;
        let detail = match &state.last_error {
            Some(err) => format!("{} consecutive failures, last: {}", failures, err),
            None => format!("{} consecutive failures", failures),
        };
        ComponentHealth::degraded(detail)
    }

    /// When the replica last answered successfully, if ever.
    pub async fn last_ok_at(&self) -> Option<Timestamp> {
        self.state.read().await.last_ok_at
    }
}

impl std::fmt::Debug for ReplicaHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicaHandle")
            .field("endpoint", &self.link.endpoint())
            .field("consecutive_failures", &self.consecutive_failures())
            .field("failure_threshold", &self.failure_threshold)
            .finish()
    }
}
