//! LMDB-backed stock store.
//!
//! Uses the heed crate (Rust bindings for LMDB) as the durable primary
//! store. A single unnamed database maps big-endian item ids to JSON rows,
//! so iteration order is id order.
//!
//! # Atomicity
//!
//! LMDB allows one write transaction at a time per environment. Every
//! mutation here runs read-check-write inside one such transaction, which
//! is exactly the serialization boundary `compare_and_decrement` requires:
//! concurrent decrements on the same id cannot interleave.

use std::path::Path;

use ::async_trait::async_trait;
use bazar_core::{
    BazarError, BazarResult, CatalogItem, CatalogSummary, ItemId, StoreError, ValidationError,
};
use chrono::Utc;
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::store::StockStore;

/// Error type for LMDB store operations.
#[derive(Debug, thiserror::Error)]
pub enum LmdbStoreError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert LmdbStoreError to BazarError.
impl From<LmdbStoreError> for BazarError {
    fn from(e: LmdbStoreError) -> Self {
        match e {
            LmdbStoreError::EnvOpen(reason) | LmdbStoreError::DbOpen(reason) => {
                BazarError::Store(StoreError::Unavailable { reason })
            }
            LmdbStoreError::Transaction(reason) => {
                BazarError::Store(StoreError::TransactionFailed { reason })
            }
            LmdbStoreError::Serialization(reason) | LmdbStoreError::Deserialization(reason) => {
                BazarError::Store(StoreError::Serialization { reason })
            }
            LmdbStoreError::Io(e) => BazarError::Store(StoreError::Unavailable {
                reason: e.to_string(),
            }),
        }
    }
}

/// Durable `StockStore` backed by LMDB.
pub struct LmdbStockStore {
    /// The LMDB environment.
    env: Env,
    /// The main database (single unnamed database).
    db: Database<Bytes, Bytes>,
}

impl LmdbStockStore {
    /// Open (or create) a store at the given directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the LMDB
    /// environment/database cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbStoreError> {
        std::fs::create_dir_all(&path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbStoreError::EnvOpen(e.to_string()))?;

        let mut wtxn = env
            .write_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbStoreError::DbOpen(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        Ok(Self { env, db })
    }

    fn encode_key(id: ItemId) -> [u8; 4] {
        id.to_be_bytes()
    }

    fn decode_item(bytes: &[u8]) -> Result<CatalogItem, LmdbStoreError> {
        serde_json::from_slice(bytes).map_err(|e| LmdbStoreError::Deserialization(e.to_string()))
    }

    fn encode_item(item: &CatalogItem) -> Result<Vec<u8>, LmdbStoreError> {
        serde_json::to_vec(item).map_err(|e| LmdbStoreError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl StockStore for LmdbStockStore {
    async fn get(&self, id: ItemId) -> BazarResult<Option<CatalogItem>> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        let key = Self::encode_key(id);
        match self
            .db
            .get(&rtxn, &key)
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?
        {
            Some(bytes) => Ok(Some(Self::decode_item(bytes)?)),
            None => Ok(None),
        }
    }

    async fn search_by_topic(&self, topic: &str) -> BazarResult<Vec<CatalogSummary>> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        let needle = topic.to_lowercase();
        let mut matches = Vec::new();

        let iter = self
            .db
            .iter(&rtxn)
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        // Keys are big-endian ids, so iteration yields results in id order.
        for result in iter {
            let (_, value) = result.map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;
            let item = Self::decode_item(value)?;
            if item.topic.to_lowercase() == needle {
                matches.push(item.summary());
            }
        }

        Ok(matches)
    }

    async fn compare_and_decrement(&self, id: ItemId, delta: i64) -> BazarResult<i64> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        let key = Self::encode_key(id);
        let bytes = self
            .db
            .get(&wtxn, &key)
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?
            .ok_or(StoreError::NotFound { id })?;

        let mut item = Self::decode_item(bytes)?;
        let new_count = item.count + delta;
        if new_count < 0 {
            // Dropping the transaction aborts it; nothing was written.
            return Err(StoreError::InsufficientStock {
                id,
                available: item.count,
                requested: -delta,
            }
            .into());
        }

        item.count = new_count;
        item.updated_at = Utc::now();

        let encoded = Self::encode_item(&item)?;
        self.db
            .put(&mut wtxn, &key, &encoded)
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        Ok(new_count)
    }

    async fn set_count(&self, id: ItemId, count: i64) -> BazarResult<i64> {
        if count < 0 {
            return Err(ValidationError::InvalidCount { count }.into());
        }

        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        let key = Self::encode_key(id);
        let bytes = self
            .db
            .get(&wtxn, &key)
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?
            .ok_or(StoreError::NotFound { id })?;

        let mut item = Self::decode_item(bytes)?;
        let previous = item.count;
        item.count = count;
        item.updated_at = Utc::now();

        let encoded = Self::encode_item(&item)?;
        self.db
            .put(&mut wtxn, &key, &encoded)
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        Ok(previous)
    }

    async fn insert(&self, item: CatalogItem) -> BazarResult<bool> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        let key = Self::encode_key(item.id);
        let exists = self
            .db
            .get(&wtxn, &key)
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?
            .is_some();
        if exists {
            return Ok(false);
        }

        let encoded = Self::encode_item(&item)?;
        self.db
            .put(&mut wtxn, &key, &encoded)
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        Ok(true)
    }

    async fn ping(&self) -> BazarResult<()> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;
        self.db
            .len(&rtxn)
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;
        Ok(())
    }
}
