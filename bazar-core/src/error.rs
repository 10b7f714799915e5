//! Error types for Bazar inventory operations
//!
//! The taxonomy separates business rejections (never retried) from
//! transient infrastructure failures (retried with bounded backoff).
//! `BazarError::is_transient` is the single classification point the
//! retry and failover paths consult.

use crate::ItemId;
use thiserror::Error;

/// Durable store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Item not found: {id}")]
    NotFound { id: ItemId },

    #[error("Insufficient stock for item {id}: available {available}, requested {requested}")]
    InsufficientStock {
        id: ItemId,
        available: i64,
        requested: i64,
    },

    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Store operation timed out: {operation}")]
    Timeout { operation: String },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

/// Replica link errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReplicaError {
    #[error("Replica {endpoint} unreachable: {reason}")]
    Unreachable { endpoint: String, reason: String },

    #[error("Replica {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("Replica diverged on item {id}: expected count {expected}, observed {observed}")]
    Divergence {
        id: ItemId,
        expected: i64,
        observed: i64,
    },

    #[error("Bad response from replica {endpoint} (status {status}): {reason}")]
    BadResponse {
        endpoint: String,
        status: u16,
        reason: String,
    },
}

/// Validation errors, rejected before any store access.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid purchase quantity {quantity}: must be at least 1")]
    InvalidQuantity { quantity: i64 },

    #[error("Invalid count {count}: must be non-negative")]
    InvalidCount { count: i64 },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value} - {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Bazar operations.
#[derive(Debug, Clone, Error)]
pub enum BazarError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Replica error: {0}")]
    Replica(#[from] ReplicaError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl BazarError {
    /// Whether this failure is worth retrying or failing over.
    ///
    /// Transient failures are infrastructure problems that a later attempt
    /// may not hit. Business rejections (`NotFound`, `InsufficientStock`),
    /// validation and divergence are terminal: retrying them cannot change
    /// the answer.
    pub fn is_transient(&self) -> bool {
        match self {
            BazarError::Store(e) => matches!(
                e,
                StoreError::Unavailable { .. }
                    | StoreError::Timeout { .. }
                    | StoreError::TransactionFailed { .. }
            ),
            BazarError::Replica(e) => matches!(
                e,
                ReplicaError::Unreachable { .. } | ReplicaError::Timeout { .. }
            ),
            BazarError::Validation(_) => false,
            BazarError::Config(_) => false,
        }
    }

    /// Whether this is the not-found rejection, regardless of which side
    /// (store or replica) reported it.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BazarError::Store(StoreError::NotFound { .. }))
    }

    /// Whether this is the out-of-stock business rejection.
    pub fn is_insufficient_stock(&self) -> bool {
        matches!(self, BazarError::Store(StoreError::InsufficientStock { .. }))
    }
}

/// Result type alias for Bazar operations.
pub type BazarResult<T> = Result<T, BazarError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display_not_found() {
        let err = StoreError::NotFound { id: 42 };
        let msg = format!("{}", err);
        assert!(msg.contains("Item not found"));
        assert!(msg.contains("42"));
    }

    #[test]
    fn test_store_error_display_insufficient_stock() {
        let err = StoreError::InsufficientStock {
            id: 1,
            available: 0,
            requested: 1,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Insufficient stock"));
        assert!(msg.contains("available 0"));
        assert!(msg.contains("requested 1"));
    }

    #[test]
    fn test_replica_error_display_divergence() {
        let err = ReplicaError::Divergence {
            id: 2,
            expected: 99,
            observed: 97,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("diverged"));
        assert!(msg.contains("99"));
        assert!(msg.contains("97"));
    }

    #[test]
    fn test_validation_error_display_invalid_quantity() {
        let err = ValidationError::InvalidQuantity { quantity: 0 };
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid purchase quantity"));
        assert!(msg.contains("0"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            key: "commit_max_attempts".to_string(),
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("commit_max_attempts"));
        assert!(msg.contains("must be at least 1"));
    }

    #[test]
    fn test_bazar_error_from_variants() {
        let store = BazarError::from(StoreError::NotFound { id: 1 });
        assert!(matches!(store, BazarError::Store(_)));

        let replica = BazarError::from(ReplicaError::Timeout {
            endpoint: "http://replica:3001".to_string(),
        });
        assert!(matches!(replica, BazarError::Replica(_)));

        let validation = BazarError::from(ValidationError::InvalidQuantity { quantity: -1 });
        assert!(matches!(validation, BazarError::Validation(_)));

        let config = BazarError::from(ConfigError::InvalidValue {
            key: "cache_ttl".to_string(),
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        });
        assert!(matches!(config, BazarError::Config(_)));
    }

    #[test]
    fn test_transient_classification() {
        let transient = [
            BazarError::from(StoreError::Unavailable {
                reason: "connection refused".to_string(),
            }),
            BazarError::from(StoreError::Timeout {
                operation: "get".to_string(),
            }),
            BazarError::from(StoreError::TransactionFailed {
                reason: "env closed".to_string(),
            }),
            BazarError::from(ReplicaError::Unreachable {
                endpoint: "http://replica:3001".to_string(),
                reason: "dns".to_string(),
            }),
            BazarError::from(ReplicaError::Timeout {
                endpoint: "http://replica:3001".to_string(),
            }),
        ];
        for err in &transient {
            assert!(err.is_transient(), "{err} should be transient");
        }

        let terminal = [
            BazarError::from(StoreError::NotFound { id: 9 }),
            BazarError::from(StoreError::InsufficientStock {
                id: 1,
                available: 0,
                requested: 1,
            }),
            BazarError::from(ValidationError::InvalidQuantity { quantity: 0 }),
            BazarError::from(ReplicaError::Divergence {
                id: 1,
                expected: 5,
                observed: 4,
            }),
        ];
        for err in &terminal {
            assert!(!err.is_transient(), "{err} should be terminal");
        }
    }

    #[test]
    fn test_rejection_predicates() {
        assert!(BazarError::from(StoreError::NotFound { id: 3 }).is_not_found());
        assert!(BazarError::from(StoreError::InsufficientStock {
            id: 3,
            available: 0,
            requested: 2,
        })
        .is_insufficient_stock());
        assert!(!BazarError::from(StoreError::NotFound { id: 3 }).is_insufficient_stock());
    }
}

// =============================================================================
// PROPERTY-BASED TESTS
// =============================================================================
