use crate::clock::Clock;
use crate::metrics::TokenMetrics;
use crate::store::{Store, StoreError, TokenStore};
use crate::token::Token;
use credential_client::fingerprint;
use log::debug;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of checking a token value against the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Introspection {
    Active(Token),
    Inactive,
}

/// Read-only validity check of token values
#[derive(Clone)]
pub struct IntrospectionService {
    store: Arc<Store>,
    clock: Arc<dyn Clock>,
    metrics: TokenMetrics,
}

impl IntrospectionService {
    pub fn new(store: Arc<Store>, clock: Arc<dyn Clock>, metrics: TokenMetrics) -> Self {
        Self {
            store,
            clock,
            metrics,
        }
    }

    /// Decide whether `value` is an active token.
    ///
    /// Unknown and expired tokens are `Ok(Inactive)`. An `Err` means the store could not
    /// answer and says nothing about the token. The call latency is observed exactly once.
    pub async fn introspect(&self, value: &str) -> Result<Introspection, StoreError> {
        let started = Instant::now();
        let result = self.evaluate(value).await;
        self.metrics
            .observe_introspection(started.elapsed().as_secs_f64());
        result
    }

    async fn evaluate(&self, value: &str) -> Result<Introspection, StoreError> {
        if value.is_empty() {
            return Ok(Introspection::Inactive);
        }

        let Some(token) = self.store.lookup(value).await? else {
            debug!("Token {} not found", fingerprint(value));
            return Ok(Introspection::Inactive);
        };

        let now = self.clock.now();
        if token.is_active_at(now) {
            Ok(Introspection::Active(token))
        } else {
            debug!(
                "Token {} expired at {} (now {})",
                fingerprint(value),
                token.expires_at,
                now
            );
            Ok(Introspection::Inactive)
        }
    }
}
