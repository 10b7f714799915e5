use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use bazar_core::{BazarResult, CatalogItem, ItemId, ReplicaError, StoreError};
use bazar_service::{
    InventoryService, PurchaseCoordinator, ReplicaAck, ReplicaHandle, ReplicaLink, ServiceConfig,
};
use bazar_storage::{CacheConfig, CacheLayer, InMemoryCacheBackend, StockStore};

/// In-process replica with scriptable failures.
///
/// Holds its own copy of the catalog, so propagation drives real counts and
/// the ack carries the replica's actual previous value; seed it with a count
/// that differs from the primary's to stage a divergence.
pub struct ScriptedReplica {
    items: RwLock<HashMap<ItemId, CatalogItem>>,
    read_failures: AtomicBool,
    propagation_failures: AtomicBool,
    pub get_info_calls: AtomicU64,
    pub propagate_calls: AtomicU64,
}

impl ScriptedReplica {
    pub fn with_items(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        let map = items.into_iter().map(|i| (i.id, i)).collect();
        Self {
            items: RwLock::new(map),
            read_failures: AtomicBool::new(false),
            propagation_failures: AtomicBool::new(false),
            get_info_calls: AtomicU64::new(0),
            propagate_calls: AtomicU64::new(0),
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.read_failures.store(fail, Ordering::SeqCst);
    }

    pub fn fail_propagations(&self, fail: bool) {
        self.propagation_failures.store(fail, Ordering::SeqCst);
    }

    /// The count the replica currently holds for an item.
    pub fn count_of(&self, id: ItemId) -> Option<i64> {
        self.items.read().unwrap().get(&id).map(|item| item.count)
    }

    fn unreachable(&self) -> ReplicaError {
        ReplicaError::Unreachable {
            endpoint: self.endpoint().to_string(),
            reason: "injected replica failure".to_string(),
        }
    }
}

#[async_trait]
impl ReplicaLink for ScriptedReplica {
    fn endpoint(&self) -> &str {
        "http://replica.test:3001"
    }

    async fn get_info(&self, id: ItemId) -> BazarResult<CatalogItem> {
        self.get_info_calls.fetch_add(1, Ordering::SeqCst);
        if self.read_failures.load(Ordering::SeqCst) {
            return Err(self.unreachable().into());
        }
        self.items
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id }.into())
    }

    async fn propagate_count(&self, id: ItemId, count: i64) -> BazarResult<ReplicaAck> {
        self.propagate_calls.fetch_add(1, Ordering::SeqCst);
        if self.propagation_failures.load(Ordering::SeqCst) {
            return Err(self.unreachable().into());
        }
        let mut items = self.items.write().unwrap();
        let item = items.get_mut(&id).ok_or(StoreError::NotFound { id })?;
        let previous = item.count;
        item.count = count;
        Ok(ReplicaAck {
            previous,
            current: count,
        })
    }

    async fn ping(&self) -> BazarResult<()> {
        if self.read_failures.load(Ordering::SeqCst) {
            return Err(self.unreachable().into());
        }
        Ok(())
    }
}

/// Build a coordinator over the given store with no replica deployed.
pub fn coordinator(
    store: Arc<dyn StockStore>,
    config: ServiceConfig,
) -> PurchaseCoordinator<InMemoryCacheBackend> {
    PurchaseCoordinator::from_config(store, config).expect("config should be valid")
}

/// Build a coordinator wired to the given replica link. Returns the handle
/// too so tests can inspect its recorded health.
pub fn coordinator_with_replica(
    store: Arc<dyn StockStore>,
    link: Arc<dyn ReplicaLink>,
    config: ServiceConfig,
) -> (PurchaseCoordinator<InMemoryCacheBackend>, Arc<ReplicaHandle>) {
    let handle = Arc::new(ReplicaHandle::new(link, config.replica_failure_threshold));
    let cache = CacheLayer::new(
        Arc::new(InMemoryCacheBackend::new()),
        CacheConfig::new().with_ttl(config.cache_ttl),
    );
    let inventory = InventoryService::new(store, cache);
    (
        PurchaseCoordinator::new(inventory, Some(Arc::clone(&handle)), config),
        handle,
    )
}

/// Poll `condition` until it holds or a one-second budget runs out.
/// Propagation runs on spawned tasks; this avoids fixed sleeps.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
