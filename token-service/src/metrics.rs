//! Prometheus metrics for the token service.
//!
//! Metrics live in a registry owned by the process and are exported on `GET /metrics` of the
//! dedicated metrics listener.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};

#[derive(Clone)]
pub struct TokenMetrics {
    registry: Registry,
    issued: IntCounter,
    collisions: IntCounter,
    introspection_latency: Histogram,
}

impl TokenMetrics {
    /// Create the token service metrics in a fresh registry
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let issued = IntCounter::new("issue_tokens_total", "Tokens issued")?;
        let collisions = IntCounter::new(
            "issue_collisions_total",
            "Generated token values rejected by the store as duplicates",
        )?;
        let introspection_latency = Histogram::with_opts(
            HistogramOpts::new(
                "introspection_latency_seconds",
                "Introspection latency in seconds",
            )
            .buckets(vec![
                0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
        )?;

        registry.register(Box::new(issued.clone()))?;
        registry.register(Box::new(collisions.clone()))?;
        registry.register(Box::new(introspection_latency.clone()))?;

        Ok(Self {
            registry,
            issued,
            collisions,
            introspection_latency,
        })
    }

    pub fn record_issued(&self) {
        self.issued.inc();
    }

    pub fn record_collision(&self) {
        self.collisions.inc();
    }

    pub fn observe_introspection(&self, latency_secs: f64) {
        self.introspection_latency.observe(latency_secs);
    }

    #[cfg(test)]
    pub fn issued(&self) -> u64 {
        self.issued.get()
    }

    #[cfg(test)]
    pub fn collisions(&self) -> u64 {
        self.collisions.get()
    }

    #[cfg(test)]
    pub fn introspections(&self) -> u64 {
        self.introspection_latency.get_sample_count()
    }

    /// Render all metrics in the Prometheus text format
    pub fn encode(&self) -> Result<(String, String), prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        let body = String::from_utf8(buffer)
            .map_err(|e| prometheus::Error::Msg(format!("metrics are not UTF-8: {}", e)))?;
        Ok((encoder.format_type().to_string(), body))
    }
}
