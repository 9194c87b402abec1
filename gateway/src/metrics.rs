//! Prometheus metrics for the gateway.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Instant;

/// Outcome label of a request whose caller went away before it completed
pub const CANCELLED: &str = "cancelled";

#[derive(Clone)]
pub struct GatewayMetrics {
    registry: Registry,
    latency: HistogramVec,
    requests: IntCounterVec,
}

impl GatewayMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let latency = HistogramVec::new(
            HistogramOpts::new(
                "gateway_request_latency_seconds",
                "Gateway request latency in seconds, by outcome",
            )
            .buckets(vec![
                0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
            &["outcome"],
        )?;
        let requests = IntCounterVec::new(
            Opts::new("gateway_requests_total", "Gateway requests, by outcome"),
            &["outcome"],
        )?;

        registry.register(Box::new(latency.clone()))?;
        registry.register(Box::new(requests.clone()))?;

        Ok(Self {
            registry,
            latency,
            requests,
        })
    }

    /// Start timing a request. The timer records exactly once: on `finish`, or as
    /// `cancelled` when dropped unfinished.
    pub fn start_request(&self) -> RequestTimer<'_> {
        RequestTimer {
            metrics: self,
            started: Instant::now(),
            finished: false,
        }
    }

    fn observe(&self, outcome: &str, latency_secs: f64) {
        self.latency
            .with_label_values(&[outcome])
            .observe(latency_secs);
        self.requests.with_label_values(&[outcome]).inc();
    }

    /// Number of requests recorded with `outcome`
    #[cfg(test)]
    pub fn count(&self, outcome: &str) -> u64 {
        self.requests.with_label_values(&[outcome]).get()
    }

    /// Number of latency samples across all outcomes
    #[cfg(test)]
    pub fn latency_samples(&self) -> u64 {
        [
            "ok",
            "missing_bearer",
            "inactive_token",
            "introspection_unavailable",
            "upstream_error",
            CANCELLED,
        ]
        .iter()
        .map(|outcome| self.latency.with_label_values(&[*outcome]).get_sample_count())
        .sum()
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

pub struct RequestTimer<'a> {
    metrics: &'a GatewayMetrics,
    started: Instant,
    finished: bool,
}

impl RequestTimer<'_> {
    pub fn finish(mut self, outcome: &str) {
        self.finished = true;
        self.metrics
            .observe(outcome, self.started.elapsed().as_secs_f64());
    }
}

impl Drop for RequestTimer<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.metrics
                .observe(CANCELLED, self.started.elapsed().as_secs_f64());
        }
    }
}
