//! Starter catalog and idempotent seeding.
//!
//! The four classic titles every fresh deployment starts with. Ids are
//! fixed so that primary and replica agree on the keyspace from the start.

use bazar_core::{BazarResult, CatalogItem};
use tracing::info;

use crate::store::StockStore;

/// The catalog rows a fresh store is seeded with.
pub fn starter_catalog() -> Vec<CatalogItem> {
    vec![
        CatalogItem::new(
            1,
            "How to get a good grade in DOS in 40 minutes a day",
            "distributed systems",
            100,
            50.0,
        ),
        CatalogItem::new(2, "RPCs for Noobs", "distributed systems", 100, 40.0),
        CatalogItem::new(
            3,
            "Xen and the Art of Surviving Undergraduate School",
            "undergraduate school",
            100,
            30.0,
        ),
        CatalogItem::new(
            4,
            "Cooking for the Impatient Undergrad",
            "undergraduate school",
            100,
            20.0,
        ),
    ]
}

/// Seed the starter catalog into a store. Rows whose id already exists are
/// left alone, so re-running against a populated store changes nothing.
/// Returns the number of rows actually inserted.
pub async fn seed_catalog(store: &dyn StockStore) -> BazarResult<u32> {
    let mut inserted = 0u32;
    for item in starter_catalog() {
        let id = item.id;
        if store.insert(item).await? {
            inserted += 1;
        } else {
            info!(item_id = id, "Seed row already present, skipping");
        }
    }
    Ok(inserted)
}
