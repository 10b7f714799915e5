//! Purchase pipeline counters
//!
//! Process-local counters, incremented from the coordinator's hot path and
//! read by the health surface. No external metrics pipeline; embedders that
//! want one can export the snapshot themselves.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the purchase pipeline.
///
/// All fields are monotonically increasing over the process lifetime.
#[derive(Debug, Default)]
pub struct PurchaseMetrics {
    /// Purchases that entered the pipeline (after quantity validation).
    pub attempted: AtomicU64,
    /// Purchases that committed and produced a receipt.
    pub succeeded: AtomicU64,
    /// Purchases rejected because the item does not exist.
    pub rejected_not_found: AtomicU64,
    /// Purchases rejected because stock ran out.
    pub rejected_insufficient_stock: AtomicU64,
    /// Purchases that failed after exhausting retries or losing both stores.
    pub failed_unavailable: AtomicU64,
    /// Commit attempts beyond the first, across all purchases.
    pub commit_retries: AtomicU64,
    /// Reads served by the replica after a primary failure.
    pub replica_fallback_reads: AtomicU64,
    /// Replica propagations started.
    pub propagation_attempts: AtomicU64,
    /// Replica propagations that failed (purchase unaffected).
    pub propagation_failures: AtomicU64,
    /// Propagation acks whose previous count disagreed with the primary.
    pub divergences: AtomicU64,
}

impl PurchaseMetrics {
    /// Create a new metrics instance with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> PurchaseMetricsSnapshot {
        PurchaseMetricsSnapshot {
            attempted: self.attempted.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            rejected_not_found: self.rejected_not_found.load(Ordering::Relaxed),
            rejected_insufficient_stock: self.rejected_insufficient_stock.load(Ordering::Relaxed),
            failed_unavailable: self.failed_unavailable.load(Ordering::Relaxed),
            commit_retries: self.commit_retries.load(Ordering::Relaxed),
            replica_fallback_reads: self.replica_fallback_reads.load(Ordering::Relaxed),
            propagation_attempts: self.propagation_attempts.load(Ordering::Relaxed),
            propagation_failures: self.propagation_failures.load(Ordering::Relaxed),
            divergences: self.divergences.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of purchase metrics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PurchaseMetricsSnapshot {
    pub attempted: u64,
    pub succeeded: u64,
    pub rejected_not_found: u64,
    pub rejected_insufficient_stock: u64,
    pub failed_unavailable: u64,
    pub commit_retries: u64,
    pub replica_fallback_reads: u64,
    pub propagation_attempts: u64,
    pub propagation_failures: u64,
    pub divergences: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_snapshot_is_zero() {
        let metrics = PurchaseMetrics::new();
        assert_eq!(metrics.snapshot(), PurchaseMetricsSnapshot::default());
    }

    #[test]
    fn test_snapshot_reflects_increments() {
        let metrics = PurchaseMetrics::new();
        metrics.attempted.fetch_add(3, Ordering::Relaxed);
        metrics.succeeded.fetch_add(2, Ordering::Relaxed);
        metrics.rejected_insufficient_stock.fetch_add(1, Ordering::Relaxed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.attempted, 3);
        assert_eq!(snapshot.succeeded, 2);
        assert_eq!(snapshot.rejected_insufficient_stock, 1);
        assert_eq!(snapshot.failed_unavailable, 0);
    }

    #[test]
    fn test_snapshot_serializes_with_field_names() -> Result<(), serde_json::Error> {
        let metrics = PurchaseMetrics::new();
        metrics.replica_fallback_reads.fetch_add(1, Ordering::Relaxed);
        let json = serde_json::to_string(&metrics.snapshot())?;
        assert!(json.contains("\"replica_fallback_reads\":1"));
        assert!(json.contains("\"divergences\":0"));
        Ok(())
    }
}
