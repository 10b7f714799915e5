//! Property-Based Tests for Inventory Consistency
//!
//! **Property: No Oversell**
//!
//! For any starting count and any number of concurrent buyers, the number
//! of successful purchases never exceeds the starting count, every failed
//! purchase is the out-of-stock rejection, and the final stored count is
//! exactly the starting count minus the successes. The count never goes
//! negative, no matter how writes interleave.

use std::sync::Arc;

use bazar_service::{PurchaseCoordinator, ServiceConfig};
use bazar_storage::{MemoryStockStore, StockStore};
use bazar_test_utils::{fixtures, generators::arb_delta};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// N buyers race for C units: exactly `min(N, C)` succeed, every loser
    /// sees the out-of-stock rejection, and the store ends at `C - sales`.
    #[test]
    fn prop_concurrent_purchases_never_oversell(
        initial_count in 0i64..=30,
        buyers in 1usize..=12,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let store = Arc::new(MemoryStockStore::with_items([fixtures::item(
                1,
                initial_count,
            )]));
            let coordinator = PurchaseCoordinator::from_config(
                Arc::clone(&store) as Arc<dyn StockStore>,
                ServiceConfig::development(),
            )?;

            let mut tasks = Vec::new();
            for _ in 0..buyers {
                let c = coordinator.clone();
                tasks.push(tokio::spawn(async move { c.purchase(1).await }));
            }

            let mut succeeded: i64 = 0;
            for task in tasks {
                match task.await.expect("join") {
                    Ok(receipt) => {
                        prop_assert!(receipt.remaining_stock >= 0);
                        succeeded += 1;
                    }
                    Err(e) => {
                        prop_assert!(e.is_insufficient_stock(), "unexpected failure: {e}");
                    }
                }
            }

            let expected_sales = initial_count.min(buyers as i64);
            prop_assert_eq!(succeeded, expected_sales);

            let in_store = store.get(1).await?.expect("item exists");
            prop_assert_eq!(in_store.count, initial_count - expected_sales);
            prop_assert!(in_store.count >= 0);

            // Every attempt is accounted for as a success or a rejection.
            let snapshot = coordinator.metrics().snapshot();
            prop_assert_eq!(snapshot.attempted, buyers as u64);
            prop_assert_eq!(
                snapshot.succeeded + snapshot.rejected_insufficient_stock,
                buyers as u64
            );

            Ok(())
        })?;
    }

    /// Any sequence of signed deltas leaves the count non-negative: an
    /// overdraw is rejected without effect, everything else applies exactly.
    #[test]
    fn prop_random_delta_sequences_never_drive_the_count_negative(
        initial_count in 0i64..=100,
        deltas in prop::collection::vec(arb_delta(), 0..32),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let store = MemoryStockStore::with_items([fixtures::item(7, initial_count)]);

            let mut expected = initial_count;
            for delta in deltas {
                match store.compare_and_decrement(7, delta).await {
                    Ok(new_count) => {
                        prop_assert_eq!(new_count, expected + delta);
                        expected += delta;
                    }
                    Err(e) => {
                        prop_assert!(e.is_insufficient_stock(), "unexpected failure: {e}");
                        prop_assert!(expected + delta < 0, "only overdraws may be rejected");
                    }
                }
                prop_assert!(expected >= 0);
            }

            let item = store.get(7).await?.expect("item exists");
            prop_assert_eq!(item.count, expected);

            Ok(())
        })?;
    }

    /// A bulk purchase either decrements by exactly its quantity or leaves
    /// the count untouched; there is no partial fulfilment.
    #[test]
    fn prop_bulk_purchase_decrements_exactly_or_not_at_all(
        initial_count in 0i64..=20,
        quantity in 1i64..=8,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let store = Arc::new(MemoryStockStore::with_items([fixtures::item(
                3,
                initial_count,
            )]));
            let coordinator = PurchaseCoordinator::from_config(
                Arc::clone(&store) as Arc<dyn StockStore>,
                ServiceConfig::development(),
            )?;

            let result = coordinator.purchase_many(3, quantity).await;
            let in_store = store.get(3).await?.expect("item exists");

            match result {
                Ok(receipt) => {
                    prop_assert!(quantity <= initial_count);
                    prop_assert_eq!(receipt.remaining_stock, initial_count - quantity);
                    prop_assert_eq!(in_store.count, initial_count - quantity);
                }
                Err(e) => {
                    prop_assert!(e.is_insufficient_stock(), "unexpected failure: {e}");
                    prop_assert!(quantity > initial_count);
                    prop_assert_eq!(in_store.count, initial_count);
                }
            }

            Ok(())
        })?;
    }
}
