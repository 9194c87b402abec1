use confique::Config;
use std::time::Duration;

/// Main configuration structure for the gateway
#[derive(Debug, Config, Clone)]
pub struct GatewayConfig {
    /// The port the gateway will listen to (default: 8080)
    #[config(env = "GATEWAY_PORT", default = 8080)]
    pub port: u16,

    /// The port serving Prometheus metrics (default: 9101)
    #[config(env = "GATEWAY_METRICS_PORT", default = 9101)]
    pub metrics_port: u16,

    /// Introspection endpoint of the token service
    #[config(env = "GATEWAY_INTROSPECT_URL", default = "http://auth:7000/introspect")]
    pub introspect_url: String,

    /// Base URL of the protected backend
    #[config(env = "GATEWAY_UPSTREAM_URL", default = "http://accounts:7300")]
    pub upstream_url: String,

    /// Path of the protected resource on the backend (default: "/protected")
    #[config(env = "GATEWAY_UPSTREAM_PATH", default = "/protected")]
    pub upstream_path: String,

    /// Timeout for an introspection call in milliseconds (default: 1000)
    #[config(env = "GATEWAY_INTROSPECT_TIMEOUT_MS", default = 1000)]
    pub introspect_timeout_ms: u64,

    /// Timeout for a backend call in milliseconds (default: 5000)
    #[config(env = "GATEWAY_UPSTREAM_TIMEOUT_MS", default = 5000)]
    pub upstream_timeout_ms: u64,
}

impl GatewayConfig {
    /// Creates a new GatewayConfig instance from environment variables
    pub fn new() -> Result<Self, String> {
        let config = Self::builder().env().load().map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.introspect_timeout_ms == 0 || self.upstream_timeout_ms == 0 {
            return Err("Gateway timeouts must be greater than zero".to_string());
        }
        if self.port != 0 && self.port == self.metrics_port {
            return Err(format!(
                "GATEWAY_METRICS_PORT must differ from GATEWAY_PORT ({})",
                self.port
            ));
        }
        if !self.upstream_path.starts_with('/') {
            return Err(format!(
                "GATEWAY_UPSTREAM_PATH must start with '/', got '{}'",
                self.upstream_path
            ));
        }
        Ok(())
    }

    /// Full URL of the protected resource
    pub fn upstream_target(&self) -> String {
        format!(
            "{}{}",
            self.upstream_url.trim_end_matches('/'),
            self.upstream_path
        )
    }

    pub fn introspect_timeout(&self) -> Duration {
        Duration::from_millis(self.introspect_timeout_ms)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    #[cfg(test)]
    pub fn for_test_with_mocks(
        auth_mock: &wiremock::MockServer,
        upstream_mock: &wiremock::MockServer,
    ) -> Self {
        Self {
            port: 0, // Let the OS choose a port
            metrics_port: 0,
            introspect_url: format!("{}/introspect", auth_mock.uri()),
            upstream_url: upstream_mock.uri(),
            upstream_path: "/protected".to_string(),
            introspect_timeout_ms: 300,
            upstream_timeout_ms: 300,
        }
    }
}
