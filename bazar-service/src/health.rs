//! Health surface: one snapshot covering store, replica, cache and purchases.
//!
//! Probes are read-only. The replica probe in particular never touches the
//! handle's failure tracking; only real read and propagation traffic does.

use std::time::Instant;

use bazar_core::{ComponentHealth, HealthStatus, Timestamp};
use bazar_storage::{CacheBackend, CacheStats};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::coordinator::PurchaseCoordinator;
use crate::metrics::PurchaseMetricsSnapshot;

/// Point-in-time health of the whole inventory stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Aggregated verdict across components.
    pub status: HealthStatus,
    /// Primary store connectivity.
    pub store: ComponentHealth,
    /// Replica link health; `unknown` when no replica is configured.
    pub replica: ComponentHealth,
    /// Cache counters since startup.
    pub cache: CacheStats,
    /// Purchase counters since startup.
    pub purchases: PurchaseMetricsSnapshot,
    /// When the snapshot was taken.
    pub checked_at: Timestamp,
}

/// Probe every component and assemble a [`HealthReport`].
pub async fn check_health<B: CacheBackend>(coordinator: &PurchaseCoordinator<B>) -> HealthReport {
    let store = probe_store(coordinator).await;
    let replica = probe_replica(coordinator).await;
    let cache = coordinator
        .inventory()
        .cache_stats()
        .await
        .unwrap_or_default();
    let purchases = coordinator.metrics().snapshot();
    let status = overall(&store, &replica);

    HealthReport {
        status,
        store,
        replica,
        cache,
        purchases,
        checked_at: Utc::now(),
    }
}

async fn probe_store<B: CacheBackend>(coordinator: &PurchaseCoordinator<B>) -> ComponentHealth {
    let started = Instant::now();
    match timeout(
        coordinator.config().call_timeout,
        coordinator.inventory().ping_store(),
    )
    .await
    {
        Ok(Ok(())) => ComponentHealth::healthy().with_latency(started.elapsed().as_millis() as i64),
        Ok(Err(e)) => ComponentHealth::unhealthy(e.to_string()),
        Err(_) => ComponentHealth::unhealthy("store ping timed out"),
    }
}

async fn probe_replica<B: CacheBackend>(coordinator: &PurchaseCoordinator<B>) -> ComponentHealth {
    let Some(handle) = coordinator.replica() else {
        return ComponentHealth::unknown();
    };

    // A replica that answers pings but fails real calls is still degraded.
    if handle.is_degraded() {
        return handle.health().await;
    }

    let started = Instant::now();
    match timeout(coordinator.config().call_timeout, handle.link().ping()).await {
        Ok(Ok(())) => ComponentHealth::healthy().with_latency(started.elapsed().as_millis() as i64),
        Ok(Err(e)) => ComponentHealth::unhealthy(e.to_string()),
        Err(_) => ComponentHealth::unhealthy("replica ping timed out"),
    }
}

/// Aggregate component statuses into one verdict.
///
/// A missing replica (`Unknown`) does not penalize the stack, and a dead
/// replica caps at `Degraded`: reads and purchases still work through the
/// primary alone.
fn overall(store: &ComponentHealth, replica: &ComponentHealth) -> HealthStatus {
    let replica_effective = match replica.status {
        HealthStatus::Unhealthy => HealthStatus::Degraded,
        HealthStatus::Unknown => HealthStatus::Healthy,
        other => other,
    };
    store.status.worst(replica_effective)
}

// =============================================================================
// TESTS
// =============================================================================
