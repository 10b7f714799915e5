//! Runtime configuration for the inventory service
//!
//! All knobs have sane defaults and can be overridden from the environment:
//! - `BAZAR_CACHE_TTL_SECS` - cache entry time-to-live in seconds
//! - `BAZAR_CALL_TIMEOUT_MS` - per-call deadline for store and replica calls
//! - `BAZAR_COMMIT_MAX_ATTEMPTS` - bounded retry budget for purchase commits
//! - `BAZAR_COMMIT_BACKOFF_MS` - fixed delay between commit attempts
//! - `BAZAR_REPLICA_ENDPOINT` - base URL of the replica (unset = no replica)
//! - `BAZAR_REPLICA_FAILURE_THRESHOLD` - consecutive failures before degraded

use bazar_core::ConfigError;
use std::time::Duration;

const DEFAULT_CACHE_TTL_SECS: u64 = 100;
const DEFAULT_CALL_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_COMMIT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_COMMIT_BACKOFF_MS: u64 = 200;
const DEFAULT_REPLICA_FAILURE_THRESHOLD: u32 = 3;

/// Configuration for the inventory service and purchase coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// How long a cache entry stays fresh.
    pub cache_ttl: Duration,

    /// Deadline applied to each individual store or replica call.
    pub call_timeout: Duration,

    /// Maximum commit attempts per purchase (first try included).
    pub commit_max_attempts: u32,

    /// Fixed delay between commit attempts.
    pub commit_backoff: Duration,

    /// Base URL of the replica inventory service, if one is deployed.
    pub replica_endpoint: Option<String>,

    /// Consecutive replica failures before the handle reports degraded.
    pub replica_failure_threshold: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            call_timeout: Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS),
            commit_max_attempts: DEFAULT_COMMIT_MAX_ATTEMPTS,
            commit_backoff: Duration::from_millis(DEFAULT_COMMIT_BACKOFF_MS),
            replica_endpoint: None,
            replica_failure_threshold: DEFAULT_REPLICA_FAILURE_THRESHOLD,
        }
    }
}

impl ServiceConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            cache_ttl: Duration::from_secs(
                std::env::var("BAZAR_CACHE_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_CACHE_TTL_SECS),
            ),
            call_timeout: Duration::from_millis(
                std::env::var("BAZAR_CALL_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_CALL_TIMEOUT_MS),
            ),
            commit_max_attempts: std::env::var("BAZAR_COMMIT_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_COMMIT_MAX_ATTEMPTS),
            commit_backoff: Duration::from_millis(
                std::env::var("BAZAR_COMMIT_BACKOFF_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_COMMIT_BACKOFF_MS),
            ),
            replica_endpoint: std::env::var("BAZAR_REPLICA_ENDPOINT")
                .ok()
                .filter(|s| !s.is_empty()),
            replica_failure_threshold: std::env::var("BAZAR_REPLICA_FAILURE_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_REPLICA_FAILURE_THRESHOLD),
        }
    }

    /// Development preset: short timers so staleness and retries are easy
    /// to observe interactively.
    pub fn development() -> Self {
        Self {
            cache_ttl: Duration::from_secs(5),
            call_timeout: Duration::from_millis(1_000),
            commit_max_attempts: 2,
            commit_backoff: Duration::from_millis(50),
            replica_endpoint: None,
            replica_failure_threshold: 2,
        }
    }

    /// Production preset: default timers with a larger retry budget.
    pub fn production() -> Self {
        Self {
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            call_timeout: Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS),
            commit_max_attempts: 5,
            commit_backoff: Duration::from_millis(DEFAULT_COMMIT_BACKOFF_MS),
            replica_endpoint: None,
            replica_failure_threshold: DEFAULT_REPLICA_FAILURE_THRESHOLD,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.commit_max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "commit_max_attempts".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.cache_ttl.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "cache_ttl".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.call_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "call_timeout".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.replica_failure_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                key: "replica_failure_threshold".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // from_env tests mutate process-wide state; serialize them.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    struct EnvVarGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: Option<&str>) -> Self {
            let previous = std::env::var(key).ok();
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
            Self { key, previous }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match self.previous.as_deref() {
                Some(value) => std::env::set_var(self.key, value),
                None => std::env::remove_var(self.key),
            }
        }
    }

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.cache_ttl, Duration::from_secs(100));
        assert_eq!(config.call_timeout, Duration::from_millis(3_000));
        assert_eq!(config.commit_max_attempts, 3);
        assert_eq!(config.commit_backoff, Duration::from_millis(200));
        assert!(config.replica_endpoint.is_none());
        assert_eq!(config.replica_failure_threshold, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_development_preset_uses_short_timers() {
        let config = ServiceConfig::development();
        assert!(config.cache_ttl < ServiceConfig::default().cache_ttl);
        assert!(config.commit_backoff < ServiceConfig::default().commit_backoff);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_preset_has_larger_retry_budget() {
        let config = ServiceConfig::production();
        assert!(config.commit_max_attempts >= ServiceConfig::default().commit_max_attempts);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let config = ServiceConfig {
            commit_max_attempts: 0,
            ..ServiceConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(format!("{}", err).contains("commit_max_attempts"));
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let config = ServiceConfig {
            cache_ttl: Duration::ZERO,
            ..ServiceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let config = ServiceConfig {
            replica_failure_threshold: 0,
            ..ServiceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_env_reads_overrides() {
        let _env_lock = ENV_MUTEX.lock().expect("env mutex should not be poisoned");
        let _ttl = EnvVarGuard::set("BAZAR_CACHE_TTL_SECS", Some("30"));
        let _timeout = EnvVarGuard::set("BAZAR_CALL_TIMEOUT_MS", Some("500"));
        let _attempts = EnvVarGuard::set("BAZAR_COMMIT_MAX_ATTEMPTS", Some("7"));
        let _backoff = EnvVarGuard::set("BAZAR_COMMIT_BACKOFF_MS", Some("25"));
        let _endpoint = EnvVarGuard::set("BAZAR_REPLICA_ENDPOINT", Some("http://replica:3001"));
        let _threshold = EnvVarGuard::set("BAZAR_REPLICA_FAILURE_THRESHOLD", Some("5"));

        let config = ServiceConfig::from_env();

        assert_eq!(config.cache_ttl, Duration::from_secs(30));
        assert_eq!(config.call_timeout, Duration::from_millis(500));
        assert_eq!(config.commit_max_attempts, 7);
        assert_eq!(config.commit_backoff, Duration::from_millis(25));
        assert_eq!(config.replica_endpoint.as_deref(), Some("http://replica:3001"));
        assert_eq!(config.replica_failure_threshold, 5);
    }

    #[test]
    fn test_from_env_falls_back_on_unset_garbage_or_empty() {
        let _env_lock = ENV_MUTEX.lock().expect("env mutex should not be poisoned");
        let _ttl = EnvVarGuard::set("BAZAR_CACHE_TTL_SECS", Some("not-a-number"));
        let _timeout = EnvVarGuard::set("BAZAR_CALL_TIMEOUT_MS", None);
        let _attempts = EnvVarGuard::set("BAZAR_COMMIT_MAX_ATTEMPTS", None);
        let _backoff = EnvVarGuard::set("BAZAR_COMMIT_BACKOFF_MS", None);
        let _endpoint = EnvVarGuard::set("BAZAR_REPLICA_ENDPOINT", Some(""));
        let _threshold = EnvVarGuard::set("BAZAR_REPLICA_FAILURE_THRESHOLD", Some("-1"));

        let config = ServiceConfig::from_env();

        assert_eq!(config, ServiceConfig::default());
        assert!(config.replica_endpoint.is_none(), "empty endpoint means no replica");
    }
}
