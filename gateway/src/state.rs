use crate::authorizer::GatewayAuthorizer;
use crate::config::GatewayConfig;
use crate::metrics::GatewayMetrics;
use credential_client::HttpIntrospector;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub authorizer: Arc<GatewayAuthorizer>,
    pub metrics: GatewayMetrics,
}

impl AppState {
    pub fn new(config: &GatewayConfig) -> Result<Self, prometheus::Error> {
        let introspector =
            HttpIntrospector::new(config.introspect_url.clone(), config.introspect_timeout());
        let authorizer = GatewayAuthorizer::new(
            Arc::new(introspector),
            config.upstream_target(),
            config.upstream_timeout(),
        );

        Ok(Self {
            authorizer: Arc::new(authorizer),
            metrics: GatewayMetrics::new()?,
        })
    }
}
