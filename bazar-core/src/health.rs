//! Unified health check types
//!
//! Shared by the health surface in the service crate so that store, replica
//! and cache health all report through the same shape.

use serde::{Deserialize, Serialize};

/// Health status for a service or component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Component is fully operational
    Healthy,
    /// Component is operational but degraded
    Degraded,
    /// Component is not operational
    Unhealthy,
    /// Health status is unknown (e.g., not yet checked)
    Unknown,
}

impl HealthStatus {
    /// The worse of two statuses, for aggregating component health into an
    /// overall verdict. `Unknown` is treated as worse than `Healthy` but
    /// better than `Degraded`.
    pub fn worst(self, other: HealthStatus) -> HealthStatus {
        fn rank(s: HealthStatus) -> u8 {
            match s {
                HealthStatus::Healthy => 0,
                HealthStatus::Unknown => 1,
                HealthStatus::Degraded => 2,
                HealthStatus::Unhealthy => 3,
            }
        }
        if rank(other) > rank(self) {
            other
        } else {
            self
        }
    }
}

/// Detailed health check result for a single component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Overall health status
    pub status: HealthStatus,
    /// Probe latency in milliseconds (if the component was probed)
    pub latency_ms: Option<i64>,
    /// Error message when not healthy
    pub error: Option<String>,
}

impl ComponentHealth {
    /// Create a healthy check result.
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            latency_ms: None,
            error: None,
        }
    }

    /// Create a degraded check result.
    pub fn degraded(error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Degraded,
            latency_ms: None,
            error: Some(error.into()),
        }
    }

    /// Create an unhealthy check result.
    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            latency_ms: None,
            error: Some(error.into()),
        }
    }

    /// Create an unknown check result (component not probed).
    pub fn unknown() -> Self {
        Self {
            status: HealthStatus::Unknown,
            latency_ms: None,
            error: None,
        }
    }

    /// Set the probe latency.
    pub fn with_latency(mut self, ms: i64) -> Self {
        self.latency_ms = Some(ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).expect("serializes"),
            "\"degraded\""
        );
        let parsed: HealthStatus = serde_json::from_str("\"unhealthy\"").expect("parses");
        assert_eq!(parsed, HealthStatus::Unhealthy);
    }

    #[test]
    fn test_worst_ordering() {
        assert_eq!(
            HealthStatus::Healthy.worst(HealthStatus::Degraded),
            HealthStatus::Degraded
        );
        assert_eq!(
            HealthStatus::Unhealthy.worst(HealthStatus::Degraded),
            HealthStatus::Unhealthy
        );
        assert_eq!(
            HealthStatus::Healthy.worst(HealthStatus::Unknown),
            HealthStatus::Unknown
        );
        assert_eq!(
            HealthStatus::Degraded.worst(HealthStatus::Unknown),
            HealthStatus::Degraded
        );
    }

    #[test]
    fn test_component_health_constructors() {
        let h = ComponentHealth::healthy().with_latency(12);
        assert_eq!(h.status, HealthStatus::Healthy);
        assert_eq!(h.latency_ms, Some(12));
        assert!(h.error.is_none());

        let d = ComponentHealth::degraded("3 consecutive failures");
        assert_eq!(d.status, HealthStatus::Degraded);
        assert_eq!(d.error.as_deref(), Some("3 consecutive failures"));
    }
}
