use crate::clock::Clock;
use crate::metrics::TokenMetrics;
use crate::store::{Store, StoreError, TokenStore};
use crate::token::Token;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use credential_client::fingerprint;
use log::{info, warn};
use rand::RngCore;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

/// Prefix of every generated token value
pub const TOKEN_PREFIX: &str = "tok_";

/// Random bytes behind a token value, 192 bits
const TOKEN_BYTES: usize = 24;

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("Token store error: {0}")]
    Store(#[from] StoreError),
    #[error("Could not generate a unique token value after {0} attempts")]
    Exhausted(u32),
    #[error("Expiry of a token issued at {issued_at} with a TTL of {ttl}s is out of range")]
    ExpiryOutOfRange { issued_at: u64, ttl: u64 },
}

/// Source of candidate token values
pub trait TokenGenerator: Send + Sync + Debug {
    fn generate(&self) -> String;
}

/// Generates `tok_` followed by URL-safe base64 of 24 bytes from the thread-local CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokenGenerator;

impl TokenGenerator for RandomTokenGenerator {
    fn generate(&self) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        format!("{}{}", TOKEN_PREFIX, URL_SAFE_NO_PAD.encode(bytes))
    }
}

/// Mints tokens and persists them in the token store
#[derive(Clone)]
pub struct IssuanceService {
    store: Arc<Store>,
    clock: Arc<dyn Clock>,
    generator: Arc<dyn TokenGenerator>,
    metrics: TokenMetrics,
    ttl_secs: u64,
    max_attempts: u32,
}

impl IssuanceService {
    pub fn new(
        store: Arc<Store>,
        clock: Arc<dyn Clock>,
        metrics: TokenMetrics,
        ttl_secs: u64,
        max_attempts: u32,
    ) -> Self {
        Self {
            store,
            clock,
            generator: Arc::new(RandomTokenGenerator),
            metrics,
            ttl_secs,
            max_attempts,
        }
    }

    /// Replace the token value generator
    pub fn with_generator(mut self, generator: Arc<dyn TokenGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Issue a new token for `subject` with `scope`, valid for the configured TTL.
    ///
    /// A value the store already holds is discarded and a new one generated, up to the
    /// configured number of attempts.
    pub async fn issue(&self, subject: &str, scope: &str) -> Result<Token, IssueError> {
        for attempt in 1..=self.max_attempts {
            let issued_at = self.clock.now();
            let token = Token::new(
                self.generator.generate(),
                subject.to_string(),
                scope.to_string(),
                issued_at,
                self.ttl_secs,
            )
            .ok_or(IssueError::ExpiryOutOfRange {
                issued_at,
                ttl: self.ttl_secs,
            })?;

            match self.store.insert(&token).await {
                Ok(()) => {
                    self.metrics.record_issued();
                    info!(
                        "Issued token {} to '{}' with scope '{}', expires at {}",
                        fingerprint(&token.value),
                        token.subject,
                        token.scope,
                        token.expires_at
                    );
                    return Ok(token);
                }
                Err(StoreError::Duplicate) => {
                    self.metrics.record_collision();
                    warn!(
                        "Generated token value collided with an existing token (attempt {}/{})",
                        attempt, self.max_attempts
                    );
                }
                Err(e) => return Err(IssueError::Store(e)),
            }
        }

        Err(IssueError::Exhausted(self.max_attempts))
    }
}
