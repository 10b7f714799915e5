//! Purchase coordination across the primary store, its cache and the replica.
//!
//! A purchase is a short saga: read the item (primary first, replica only
//! when the primary fails in a transient way), decide whether stock covers
//! the requested quantity, then commit an atomic decrement against the
//! primary. The read phase only screens out obvious rejections; the
//! decrement re-checks the balance inside the store's own transaction, so a
//! stale cached read can never oversell.
//!
//! Commits never touch the replica. After a successful commit the new
//! absolute count is pushed to the replica from a spawned task; the purchase
//! result does not wait for it and does not change if it fails.

use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use bazar_core::{
    new_purchase_id, BazarError, BazarResult, ItemId, ItemSnapshot, PurchaseId, ReadSource,
    ReplicaError, StoreError, ValidationError,
};
use bazar_storage::{CacheBackend, CacheConfig, CacheLayer, InMemoryCacheBackend, StockStore};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout};

use crate::config::ServiceConfig;
use crate::inventory::{InventoryService, ItemInfo};
use crate::metrics::PurchaseMetrics;
use crate::replica::{HttpReplicaLink, ReplicaHandle};

// ============================================================================
// PURCHASE STATES
// ============================================================================

/// The states a purchase attempt walks through, in order.
///
/// Every transition is logged with the purchase id, so a single purchase can
/// be reconstructed from the log stream alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseState {
    /// Reading the item through the cache and primary store.
    ReadingPrimary,
    /// Primary read failed in a transient way; reading from the replica.
    ReadingReplica,
    /// Comparing the observed count against the requested quantity.
    Deciding,
    /// Applying the atomic decrement against the primary.
    Committing,
    /// The decrement committed and a receipt was produced.
    Done,
    /// The purchase ended with an error.
    Failed,
}

impl fmt::Display for PurchaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurchaseState::ReadingPrimary => write!(f, "reading_primary"),
            PurchaseState::ReadingReplica => write!(f, "reading_replica"),
            PurchaseState::Deciding => write!(f, "deciding"),
            PurchaseState::Committing => write!(f, "committing"),
            PurchaseState::Done => write!(f, "done"),
            PurchaseState::Failed => write!(f, "failed"),
        }
    }
}

// ============================================================================
// RECEIPT
// ============================================================================

/// Proof of a committed purchase.
///
/// `remaining_stock` is the count the atomic decrement returned, not a
/// re-read, so concurrent purchases always produce distinct values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    /// Correlates the receipt with the log lines of this attempt.
    pub purchase_id: PurchaseId,
    /// What was bought.
    pub item: ItemSnapshot,
    /// Stock left after this purchase.
    pub remaining_stock: i64,
    /// Where the pre-purchase read was served from.
    pub read_source: ReadSource,
}

// ============================================================================
// COORDINATOR
// ============================================================================

/// Drives purchases against an [`InventoryService`], with optional read
/// failover to a replica.
///
/// The replica is never a commit target. It serves reads when the primary is
/// unreachable and receives the post-commit count as a best-effort update;
/// both uses feed its health tracking but neither can change a purchase
/// outcome that the primary already produced.
pub struct PurchaseCoordinator<B: CacheBackend> {
    /// Cache-fronted primary store.
    inventory: InventoryService<B>,
    /// Failover read target and propagation sink, when deployed.
    replica: Option<Arc<ReplicaHandle>>,
    /// Timeouts and retry limits.
    config: ServiceConfig,
    /// Counters for the health surface.
    metrics: Arc<PurchaseMetrics>,
}

impl<B: CacheBackend> PurchaseCoordinator<B> {
    pub fn new(
        inventory: InventoryService<B>,
        replica: Option<Arc<ReplicaHandle>>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            inventory,
            replica,
            config,
            metrics: Arc::new(PurchaseMetrics::new()),
        }
    }

    /// Get a reference to the underlying inventory service.
    pub fn inventory(&self) -> &InventoryService<B> {
        &self.inventory
    }

    /// Get the replica handle, if one is configured.
    pub fn replica(&self) -> Option<&Arc<ReplicaHandle>> {
        self.replica.as_ref()
    }

    /// Get the active configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Get the purchase counters.
    pub fn metrics(&self) -> &PurchaseMetrics {
        &self.metrics
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Read an item, failing over to the replica when the primary fails in a
    /// transient way. A `NotFound` from the primary is a real answer and
    /// never triggers failover.
    pub async fn get_info(&self, id: ItemId) -> BazarResult<ItemInfo> {
        match self.timed_primary_read(id).await {
            Ok(info) => Ok(info),
            Err(e) if e.is_transient() => self.read_from_replica(id, e).await,
            Err(e) => Err(e),
        }
    }

    async fn timed_primary_read(&self, id: ItemId) -> BazarResult<ItemInfo> {
        match timeout(self.config.call_timeout, self.inventory.get_info(id)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                operation: format!("get_info({id})"),
            }
            .into()),
        }
    }

    async fn read_from_replica(
        &self,
        id: ItemId,
        primary_error: BazarError,
    ) -> BazarResult<ItemInfo> {
        let Some(handle) = &self.replica else {
            return Err(primary_error);
        };

        tracing::warn!(
            item_id = id,
            replica = handle.endpoint(),
            error = %primary_error,
            "Primary read failed, trying replica"
        );

        let result = match timeout(self.config.call_timeout, handle.link().get_info(id)).await {
            Ok(result) => result,
            Err(_) => Err(ReplicaError::Timeout {
                endpoint: handle.endpoint().to_string(),
            }
            .into()),
        };

        match result {
            Ok(item) => {
                handle.record_success().await;
                self.metrics
                    .replica_fallback_reads
                    .fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    item_id = id,
                    replica = handle.endpoint(),
                    "Read served by replica"
                );
                Ok(ItemInfo {
                    item,
                    source: ReadSource::Replica,
                    cached_at: Utc::now(),
                })
            }
            Err(e) if e.is_transient() => {
                let failures = handle.record_failure(&e).await;
                tracing::warn!(
                    item_id = id,
                    replica = handle.endpoint(),
                    consecutive_failures = failures,
                    error = %e,
                    "Replica fallback read failed"
                );
                Err(StoreError::Unavailable {
                    reason: format!("primary: {primary_error}; replica: {e}"),
                }
                .into())
            }
            Err(e) => {
                // The replica answered; only transport failures count
                // against its health.
                handle.record_success().await;
                Err(e)
            }
        }
    }

    // ========================================================================
    // PURCHASES
    // ========================================================================

    /// Purchase a single unit of an item.
    pub async fn purchase(&self, id: ItemId) -> BazarResult<PurchaseReceipt> {
        self.purchase_many(id, 1).await
    }

    /// Purchase `quantity` units of an item.
    pub async fn purchase_many(&self, id: ItemId, quantity: i64) -> BazarResult<PurchaseReceipt> {
        if quantity < 1 {
            return Err(ValidationError::InvalidQuantity { quantity }.into());
        }

        let purchase_id = new_purchase_id();
        self.metrics.attempted.fetch_add(1, Ordering::Relaxed);

        let result = self.run_purchase(purchase_id, id, quantity).await;
        match &result {
            Ok(receipt) => {
                self.metrics.succeeded.fetch_add(1, Ordering::Relaxed);
                trace_state(purchase_id, id, PurchaseState::Done);
                tracing::info!(
                    purchase_id = %purchase_id,
                    item_id = id,
                    quantity,
                    remaining_stock = receipt.remaining_stock,
                    source = %receipt.read_source,
                    "Purchase committed"
                );
            }
            Err(e) => {
                if e.is_not_found() {
                    self.metrics.rejected_not_found.fetch_add(1, Ordering::Relaxed);
                } else if e.is_insufficient_stock() {
                    self.metrics
                        .rejected_insufficient_stock
                        .fetch_add(1, Ordering::Relaxed);
                } else {
                    self.metrics.failed_unavailable.fetch_add(1, Ordering::Relaxed);
                }
                trace_state(purchase_id, id, PurchaseState::Failed);
                tracing::warn!(
                    purchase_id = %purchase_id,
                    item_id = id,
                    quantity,
                    error = %e,
                    "Purchase failed"
                );
            }
        }
        result
    }

    async fn run_purchase(
        &self,
        purchase_id: PurchaseId,
        id: ItemId,
        quantity: i64,
    ) -> BazarResult<PurchaseReceipt> {
        trace_state(purchase_id, id, PurchaseState::ReadingPrimary);
        let info = match self.timed_primary_read(id).await {
            Ok(info) => info,
            Err(e) if e.is_transient() => {
                trace_state(purchase_id, id, PurchaseState::ReadingReplica);
                self.read_from_replica(id, e).await?
            }
            Err(e) => return Err(e),
        };

        trace_state(purchase_id, id, PurchaseState::Deciding);
        if info.item.count < quantity {
            return Err(StoreError::InsufficientStock {
                id,
                available: info.item.count,
                requested: quantity,
            }
            .into());
        }

        trace_state(purchase_id, id, PurchaseState::Committing);
        let remaining = self.commit(purchase_id, id, quantity).await?;

        self.spawn_propagation(purchase_id, id, quantity, remaining);

        Ok(PurchaseReceipt {
            purchase_id,
            item: info.item.snapshot(),
            remaining_stock: remaining,
            read_source: info.source,
        })
    }

    /// Apply the decrement, retrying transient failures with a fixed backoff.
    ///
    /// The store re-checks the balance under its own transaction, so a read
    /// that passed Deciding on stale data is rejected here. Rejections are
    /// final and never retried; only transport-class failures get another
    /// attempt.
    async fn commit(
        &self,
        purchase_id: PurchaseId,
        id: ItemId,
        quantity: i64,
    ) -> BazarResult<i64> {
        let mut attempt = 1u32;
        loop {
            let result = match timeout(
                self.config.call_timeout,
                self.inventory.update_count(id, -quantity),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout {
                    operation: format!("update_count({id})"),
                }
                .into()),
            };

            match result {
                Ok(new_count) => return Ok(new_count),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    if attempt >= self.config.commit_max_attempts {
                        return Err(StoreError::Unavailable {
                            reason: format!("commit failed after {attempt} attempts: {e}"),
                        }
                        .into());
                    }
                    self.metrics.commit_retries.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        purchase_id = %purchase_id,
                        item_id = id,
                        attempt,
                        max_attempts = self.config.commit_max_attempts,
                        error = %e,
                        "Commit attempt failed, backing off"
                    );
                    sleep(self.config.commit_backoff).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Push the committed count to the replica without blocking the receipt.
    ///
    /// The expected pre-propagation replica count is `new_count + quantity`;
    /// an ack reporting anything else is counted and logged as divergence
    /// but changes nothing about the already-committed purchase.
    fn spawn_propagation(
        &self,
        purchase_id: PurchaseId,
        id: ItemId,
        quantity: i64,
        new_count: i64,
    ) {
        let Some(handle) = self.replica.clone() else {
            return;
        };
        let metrics = Arc::clone(&self.metrics);
        let call_timeout = self.config.call_timeout;

        tokio::spawn(async move {
            metrics.propagation_attempts.fetch_add(1, Ordering::Relaxed);

            let result = match timeout(call_timeout, handle.link().propagate_count(id, new_count))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(ReplicaError::Timeout {
                    endpoint: handle.endpoint().to_string(),
                }
                .into()),
            };

            match result {
                Ok(ack) => {
                    handle.record_success().await;
                    let expected_previous = new_count + quantity;
                    if ack.previous != expected_previous {
                        metrics.divergences.fetch_add(1, Ordering::Relaxed);
                        let divergence: BazarError = ReplicaError::Divergence {
                            id,
                            expected: expected_previous,
                            observed: ack.previous,
                        }
                        .into();
                        tracing::warn!(
                            purchase_id = %purchase_id,
                            item_id = id,
                            error = %divergence,
                            "Replica count diverged during propagation"
                        );
                    } else {
                        tracing::debug!(
                            purchase_id = %purchase_id,
                            item_id = id,
                            count = new_count,
                            "Replica count propagated"
                        );
                    }
                }
                Err(e) => {
                    metrics.propagation_failures.fetch_add(1, Ordering::Relaxed);
                    let failures = handle.record_failure(&e).await;
                    tracing::warn!(
                        purchase_id = %purchase_id,
                        item_id = id,
                        consecutive_failures = failures,
                        error = %e,
                        "Replica propagation failed"
                    );
                }
            }
        });
    }
}

impl PurchaseCoordinator<InMemoryCacheBackend> {
    /// Assemble the default stack from configuration: the given store behind
    /// an in-memory TTL cache, plus an HTTP replica link when an endpoint is
    /// configured.
    pub fn from_config(store: Arc<dyn StockStore>, config: ServiceConfig) -> BazarResult<Self> {
        config.validate()?;

        let cache = CacheLayer::new(
            Arc::new(InMemoryCacheBackend::new()),
            CacheConfig::new().with_ttl(config.cache_ttl),
        );
        let inventory = InventoryService::new(store, cache);

        let replica = match &config.replica_endpoint {
            Some(endpoint) => {
                let link = HttpReplicaLink::new(endpoint.clone(), config.call_timeout)?;
                Some(Arc::new(ReplicaHandle::new(
                    Arc::new(link),
                    config.replica_failure_threshold,
                )))
            }
            None => None,
        };

        Ok(Self::new(inventory, replica, config))
    }
}

impl<B: CacheBackend> Clone for PurchaseCoordinator<B> {
    fn clone(&self) -> Self {
        Self {
            inventory: self.inventory.clone(),
            replica: self.replica.clone(),
            config: self.config.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<B: CacheBackend> fmt::Debug for PurchaseCoordinator<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PurchaseCoordinator")
            .field("replica", &self.replica.as_ref().map(|h| h.endpoint()))
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

fn trace_state(purchase_id: PurchaseId, item_id: ItemId, state: PurchaseState) {
    tracing::debug!(purchase_id = %purchase_id, item_id, state = %state, "Purchase state");
}

// =============================================================================
// TESTS
// =============================================================================
