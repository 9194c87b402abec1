use confique::Config;
use thiserror::Error;

pub(crate) use crate::config::store::{StoreBackend, StoreConfig};

pub mod store;

/// Longest access token lifetime accepted from configuration (one year)
pub const MAX_ACCESS_TTL_SEC: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] confique::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure for the token service
#[derive(Debug, Config, Clone)]
pub struct Settings {
    /// The port the token service will listen to (default: 7000)
    #[config(env = "AUTH_PORT", default = 7000)]
    pub port: u16,

    /// The port serving Prometheus metrics (default: 9100)
    #[config(env = "AUTH_METRICS_PORT", default = 9100)]
    pub metrics_port: u16,

    /// Lifetime of an issued access token in seconds (default: 600)
    #[config(env = "AUTH_ACCESS_TTL_SEC", default = 600)]
    pub access_ttl_sec: u64,

    /// How many token values to try when the store reports a collision (default: 5)
    #[config(env = "AUTH_ISSUE_MAX_ATTEMPTS", default = 5)]
    pub issue_max_attempts: u32,

    /// Subject used when an issuance request does not name one
    #[config(env = "AUTH_DEFAULT_SERVICE_ID", default = "accounts")]
    pub default_service_id: String,

    /// Scope used when an issuance request does not name one
    #[config(env = "AUTH_DEFAULT_SCOPE", default = "accounts:read")]
    pub default_scope: String,

    /// Token store configuration
    #[config(nested)]
    pub store: StoreConfig,
}

impl Settings {
    /// Creates a new Settings instance from environment variables
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Self::builder().env().load()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_ttl_sec == 0 {
            return Err(ConfigError::Invalid(
                "AUTH_ACCESS_TTL_SEC must be greater than zero".to_string(),
            ));
        }
        if self.access_ttl_sec > MAX_ACCESS_TTL_SEC {
            return Err(ConfigError::Invalid(format!(
                "AUTH_ACCESS_TTL_SEC must be at most {MAX_ACCESS_TTL_SEC}, got {}",
                self.access_ttl_sec
            )));
        }
        if self.port != 0 && self.port == self.metrics_port {
            return Err(ConfigError::Invalid(format!(
                "AUTH_METRICS_PORT must differ from AUTH_PORT ({})",
                self.port
            )));
        }
        if self.issue_max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "AUTH_ISSUE_MAX_ATTEMPTS must be greater than zero".to_string(),
            ));
        }
        self.store.validate()
    }

    #[cfg(test)]
    pub fn for_test() -> Self {
        Self {
            port: 0, // Let the OS choose a port
            metrics_port: 0,
            access_ttl_sec: 600,
            issue_max_attempts: 5,
            default_service_id: "accounts".to_string(),
            default_scope: "accounts:read".to_string(),
            store: StoreConfig {
                backend: "in-memory".to_string(),
                redis_url: String::new(),
                key_prefix: "token:".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_settings() {
        assert!(Settings::for_test().validate().is_ok());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let settings = Settings {
            access_ttl_sec: 0,
            ..Settings::for_test()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("AUTH_ACCESS_TTL_SEC"));
    }

    #[test]
    fn test_oversized_ttl_rejected() {
        let settings = Settings {
            access_ttl_sec: u64::MAX,
            ..Settings::for_test()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("at most"));

        let settings = Settings {
            access_ttl_sec: MAX_ACCESS_TTL_SEC,
            ..Settings::for_test()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_metrics_port_must_differ() {
        let settings = Settings {
            port: 7000,
            metrics_port: 7000,
            ..Settings::for_test()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            port: 7000,
            metrics_port: 9100,
            ..Settings::for_test()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let settings = Settings {
            issue_max_attempts: 0,
            ..Settings::for_test()
        };
        assert!(settings.validate().is_err());
    }
}
