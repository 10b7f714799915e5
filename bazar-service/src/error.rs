//! Stable error envelope for inventory operations
//!
//! Callers embedding this crate (or putting a transport in front of it)
//! receive failures in one shape: an `ErrorCode` plus a human-readable
//! message and optional details. The envelope is transport-agnostic; it
//! serializes with serde and carries no HTTP machinery.

use bazar_core::{BazarError, ReplicaError, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for inventory operation responses.
///
/// The set is closed and stable: new internal failure modes map onto an
/// existing code (usually `InternalError`) rather than growing the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Requested item does not exist
    NotFound,

    /// Item exists but has too little stock for the request
    InsufficientStock,

    /// The store (primary or replica) could not be reached
    StoreUnavailable,

    /// Primary and replica disagree on a count
    ReplicaDivergence,

    /// Operation exceeded its deadline
    Timeout,

    /// Request was rejected before touching any store
    ValidationError,

    /// Unexpected internal failure
    InternalError,
}

impl ErrorCode {
    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "Item not found",
            ErrorCode::InsufficientStock => "Insufficient stock",
            ErrorCode::StoreUnavailable => "Store temporarily unavailable",
            ErrorCode::ReplicaDivergence => "Replica count diverged from primary",
            ErrorCode::Timeout => "Operation timed out",
            ErrorCode::ValidationError => "Request validation failed",
            ErrorCode::InternalError => "Internal error",
        }
    }

    /// Whether a caller may retry the operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCode::StoreUnavailable | ErrorCode::Timeout)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// ERROR ENVELOPE
// ============================================================================

/// Structured error response for inventory operations.
///
/// Every failure that crosses the service boundary is reported in this
/// shape, regardless of which layer produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Error code categorizing the failure
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (item ids, counts, endpoints)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorEnvelope {
    /// Create a new envelope with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create an envelope with the code's default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
        }
    }

    /// Add additional details to the envelope.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    /// Create a NotFound envelope.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Create an InsufficientStock envelope.
    pub fn insufficient_stock(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InsufficientStock, message)
    }

    /// Create a StoreUnavailable envelope.
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StoreUnavailable, message)
    }

    /// Create a ReplicaDivergence envelope.
    pub fn replica_divergence(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ReplicaDivergence, message)
    }

    /// Create a Timeout envelope.
    pub fn timeout(operation: &str) -> Self {
        Self::new(
            ErrorCode::Timeout,
            format!("Operation '{}' timed out", operation),
        )
    }

    /// Create a ValidationError envelope.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Create an InternalError envelope.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorEnvelope {}

// ============================================================================
// CONVERSION FROM DOMAIN ERRORS
// ============================================================================

/// Map a domain error onto the stable envelope.
///
/// Business rejections and infrastructure failures keep their message so
/// callers can act on them. Internal failures (serialization bugs, bad
/// configuration) are logged here and reported with a generic message to
/// avoid leaking internals.
impl From<BazarError> for ErrorEnvelope {
    fn from(err: BazarError) -> Self {
        match &err {
            BazarError::Store(e) => match e {
                StoreError::NotFound { .. } => Self::not_found(e.to_string()),
                StoreError::InsufficientStock { .. } => Self::insufficient_stock(e.to_string()),
                StoreError::Unavailable { .. } | StoreError::TransactionFailed { .. } => {
                    Self::store_unavailable(e.to_string())
                }
                StoreError::Timeout { operation } => Self::timeout(operation),
                StoreError::Serialization { .. } => {
                    tracing::error!(error = %e, "Serialization failure surfaced to caller");
                    Self::from_code(ErrorCode::InternalError)
                }
            },
            BazarError::Replica(e) => match e {
                ReplicaError::Divergence { .. } => Self::replica_divergence(e.to_string()),
                ReplicaError::Timeout { endpoint } => {
                    Self::timeout(&format!("replica call to {}", endpoint))
                }
                ReplicaError::Unreachable { .. } | ReplicaError::BadResponse { .. } => {
                    Self::store_unavailable(e.to_string())
                }
            },
            BazarError::Validation(e) => Self::validation(e.to_string()),
            BazarError::Config(e) => {
                tracing::error!(error = %e, "Configuration failure surfaced to caller");
                Self::from_code(ErrorCode::InternalError)
            }
        }
    }
}
