use super::{StoreError, TokenStore};
use crate::token::Token;
use async_trait::async_trait;
use moka::future::Cache as MokaCache;

/// Process-local token store.
///
/// Entries never expire and are never evicted; an expired token stays readable so that
/// introspection can tell it apart from one that was never issued.
#[derive(Clone)]
pub struct InMemoryStore {
    tokens: MokaCache<String, Token>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tokens: MokaCache::builder().build(),
        }
    }
}

#[async_trait]
impl TokenStore for InMemoryStore {
    async fn insert(&self, token: &Token) -> Result<(), StoreError> {
        let candidate = token.clone();
        let entry = self
            .tokens
            .entry(token.value.clone())
            .or_insert_with(async move { candidate })
            .await;

        // a stale entry means another insert won the race for this value
        if entry.is_fresh() {
            Ok(())
        } else {
            Err(StoreError::Duplicate)
        }
    }

    async fn lookup(&self, value: &str) -> Result<Option<Token>, StoreError> {
        Ok(self.tokens.get(value).await)
    }

    async fn health_check(&self) -> Result<(), String> {
        Ok(())
    }
}
