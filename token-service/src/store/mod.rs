use crate::config::{Settings, StoreBackend};
use crate::token::Token;
use thiserror::Error;

pub mod memory;
#[cfg(test)]
pub mod offline;
pub mod redis;

/// Errors that can occur during token store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("A token with this value already exists")]
    Duplicate,
    #[error("Failed to serialize token: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to parse stored token: {0}")]
    Deserialization(String),
    #[error("Token store unavailable: {0}")]
    Unavailable(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Keyed store of issued tokens.
///
/// There is no update or delete: a record is written once by `insert` and only read
/// afterwards. Implementations must serialize concurrent inserts of the same value so that
/// exactly one succeeds and every other one gets `StoreError::Duplicate`.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist a new token, failing with `StoreError::Duplicate` if the value is taken
    async fn insert(&self, token: &Token) -> Result<(), StoreError>;

    /// Find a token by value. A missing token is `Ok(None)`, not an error.
    async fn lookup(&self, value: &str) -> Result<Option<Token>, StoreError>;

    /// Check that the backend can serve requests
    async fn health_check(&self) -> Result<(), String>;
}

/// Token store selected at startup from configuration
#[derive(Clone)]
pub enum Store {
    /// Process-local store backed by Moka
    InMemory(memory::InMemoryStore),
    /// Durable store backed by Redis
    Redis(redis::RedisStore),
    /// Store whose backend is unreachable
    #[cfg(test)]
    Offline(offline::OfflineStore),
}

#[async_trait::async_trait]
impl TokenStore for Store {
    async fn insert(&self, token: &Token) -> Result<(), StoreError> {
        match self {
            Self::InMemory(store) => store.insert(token).await,
            Self::Redis(store) => store.insert(token).await,
            #[cfg(test)]
            Self::Offline(store) => store.insert(token).await,
        }
    }

    async fn lookup(&self, value: &str) -> Result<Option<Token>, StoreError> {
        match self {
            Self::InMemory(store) => store.lookup(value).await,
            Self::Redis(store) => store.lookup(value).await,
            #[cfg(test)]
            Self::Offline(store) => store.lookup(value).await,
        }
    }

    async fn health_check(&self) -> Result<(), String> {
        match self {
            Self::InMemory(store) => store.health_check().await,
            Self::Redis(store) => store.health_check().await,
            #[cfg(test)]
            Self::Offline(store) => store.health_check().await,
        }
    }
}

/// Create the token store named by the configuration
pub async fn create_store(settings: &Settings) -> Result<Store, StoreError> {
    let backend = settings
        .store
        .backend()
        .map_err(|e| StoreError::Config(e.to_string()))?;
    match backend {
        StoreBackend::InMemory => Ok(Store::InMemory(memory::InMemoryStore::new())),
        StoreBackend::Redis => {
            let url = settings.store.redis_url.trim();
            if url.is_empty() {
                return Err(StoreError::Config(
                    "Redis URL is required for the redis store".to_string(),
                ));
            }
            let store = redis::RedisStore::new(url, &settings.store.key_prefix).await?;
            Ok(Store::Redis(store))
        }
    }
}
