use super::{StoreError, TokenStore};
use crate::token::Token;
use async_trait::async_trait;
use log::error;
use redis::{aio::ConnectionManager, AsyncCommands, Client};

/// Durable token store backed by Redis.
///
/// Inserts use `SET key value NX`, so the server decides which of two racing inserts wins.
#[derive(Clone)]
pub struct RedisStore {
    conn_manager: ConnectionManager,
    key_prefix: String,
}

impl RedisStore {
    /// Connect to Redis and verify the connection with a `PING`
    pub async fn new(redis_url: &str, key_prefix: &str) -> Result<Self, StoreError> {
        let client = Client::open(redis_url)
            .map_err(|err| StoreError::Config(format!("Invalid Redis URL: {}", err)))?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|err| {
            StoreError::Unavailable(format!(
                "Failed to create Redis connection manager: {}",
                err
            ))
        })?;

        let mut conn = conn_manager.clone();
        if let Err(err) = redis::cmd("PING").query_async::<String>(&mut conn).await {
            return Err(StoreError::Unavailable(format!(
                "Failed to ping Redis: {}",
                err
            )));
        }

        Ok(Self {
            conn_manager,
            key_prefix: key_prefix.to_string(),
        })
    }

    fn key(&self, value: &str) -> String {
        format!("{}{}", self.key_prefix, value)
    }
}

#[async_trait]
impl TokenStore for RedisStore {
    async fn insert(&self, token: &Token) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(token)?;
        let mut conn = self.conn_manager.clone();

        // SET NX replies OK when the key was written and nil when it already existed
        let reply = redis::cmd("SET")
            .arg(self.key(&token.value))
            .arg(serialized)
            .arg("NX")
            .query_async::<Option<String>>(&mut conn)
            .await
            .map_err(|err| {
                error!("Redis error while inserting token: {}", err);
                StoreError::Unavailable(err.to_string())
            })?;

        match reply {
            Some(_) => Ok(()),
            None => Err(StoreError::Duplicate),
        }
    }

    async fn lookup(&self, value: &str) -> Result<Option<Token>, StoreError> {
        let mut conn = self.conn_manager.clone();

        let stored: Option<String> = conn.get(self.key(value)).await.map_err(|err| {
            error!("Redis error while looking up token: {}", err);
            StoreError::Unavailable(err.to_string())
        })?;

        stored
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|e| StoreError::Deserialization(e.to_string()))
            })
            .transpose()
    }

    async fn health_check(&self) -> Result<(), String> {
        let mut conn = self.conn_manager.clone();
        match redis::cmd("PING").query_async::<String>(&mut conn).await {
            Ok(_) => Ok(()),
            Err(err) => Err(format!("Redis health check failed: {}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redis_test::server::RedisServer;

    fn get_redis_url(server: &RedisServer) -> String {
        match &server.addr {
            redis::ConnectionAddr::Tcp(host, port) => {
                format!("redis://{}:{}/", host, port)
            }
            _ => "redis://127.0.0.1:6379/".to_string(),
        }
    }

    fn token(value: &str, subject: &str) -> Token {
        Token::new(
            value.to_string(),
            subject.to_string(),
            "accounts:read".to_string(),
            1_000,
            600,
        )
        .unwrap()
    }

    #[tokio::test]
    #[ignore]
    async fn test_redis_insert_and_lookup() {
        let server = RedisServer::new();
        let store = RedisStore::new(&get_redis_url(&server), "token:")
            .await
            .unwrap();

        store.insert(&token("tok_a", "accounts")).await.unwrap();
        assert_eq!(
            store.lookup("tok_a").await.unwrap(),
            Some(token("tok_a", "accounts"))
        );
        assert!(store.lookup("tok_missing").await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore]
    async fn test_redis_duplicate_insert() {
        let server = RedisServer::new();
        let store = RedisStore::new(&get_redis_url(&server), "token:")
            .await
            .unwrap();

        store.insert(&token("tok_a", "accounts")).await.unwrap();
        let result = store.insert(&token("tok_a", "payments")).await;
        assert!(matches!(result, Err(StoreError::Duplicate)));
        assert_eq!(
            store.lookup("tok_a").await.unwrap().unwrap().subject,
            "accounts"
        );
    }

    #[tokio::test]
    #[ignore]
    async fn test_redis_health_check() {
        let server = RedisServer::new();
        let store = RedisStore::new(&get_redis_url(&server), "token:")
            .await
            .unwrap();

        let result = store.health_check().await;
        assert!(result.is_ok(), "health check failed: {:?}", result);
    }
}
