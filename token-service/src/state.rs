use crate::clock::Clock;
use crate::config::Settings;
use crate::introspection::IntrospectionService;
use crate::issuance::IssuanceService;
use crate::metrics::TokenMetrics;
use crate::store::{Store, TokenStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<Store>,
    pub metrics: TokenMetrics,
    pub issuance: IssuanceService,
    pub introspection: IntrospectionService,
}

impl AppState {
    pub fn new(
        settings: Settings,
        store: Store,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, prometheus::Error> {
        let store = Arc::new(store);
        let metrics = TokenMetrics::new()?;
        let issuance = IssuanceService::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            metrics.clone(),
            settings.access_ttl_sec,
            settings.issue_max_attempts,
        );
        let introspection = IntrospectionService::new(Arc::clone(&store), clock, metrics.clone());

        Ok(Self {
            settings: Arc::new(settings),
            store,
            metrics,
            issuance,
            introspection,
        })
    }

    /// Check that the token store can serve requests
    pub async fn health_check(&self) -> Result<(), String> {
        self.store.health_check().await
    }
}
