use super::ConfigError;
use confique::Config;

/// Specifies which token store implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Redis,
}

/// Configuration for the token store
#[derive(Debug, Config, Clone)]
pub struct StoreConfig {
    /// Store backend: "redis" (default, durable) or "in-memory" (lost on restart)
    #[config(env = "AUTH_STORE_BACKEND", default = "redis")]
    pub backend: String,

    /// Redis connection string used by the redis backend
    #[config(env = "AUTH_STORE_REDIS_URL", default = "redis://127.0.0.1:6379/")]
    pub redis_url: String,

    /// Prefix prepended to token values to build store keys (default: "token:")
    #[config(env = "AUTH_STORE_KEY_PREFIX", default = "token:")]
    pub key_prefix: String,
}

impl StoreConfig {
    pub fn backend(&self) -> Result<StoreBackend, ConfigError> {
        match self.backend.trim().to_ascii_lowercase().as_str() {
            "in-memory" | "memory" => Ok(StoreBackend::InMemory),
            "redis" => Ok(StoreBackend::Redis),
            other => Err(ConfigError::Invalid(format!(
                "Unknown AUTH_STORE_BACKEND '{}', expected 'in-memory' or 'redis'",
                other
            ))),
        }
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.backend()? == StoreBackend::Redis && self.redis_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "AUTH_STORE_REDIS_URL is required for the redis store".to_string(),
            ));
        }
        Ok(())
    }
}
