use super::{StoreError, TokenStore};
use crate::token::Token;
use async_trait::async_trait;

/// Store that fails every operation as if its backend were down
#[derive(Debug, Clone, Default)]
pub struct OfflineStore;

#[async_trait]
impl TokenStore for OfflineStore {
    async fn insert(&self, _token: &Token) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn lookup(&self, _value: &str) -> Result<Option<Token>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn health_check(&self) -> Result<(), String> {
        Err("connection refused".to_string())
    }
}
