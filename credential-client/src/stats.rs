use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Statistics for the RotationAgent
#[derive(Debug)]
pub(crate) struct RotationStats {
    /// Number of scheduled ticks processed
    ticks: AtomicUsize,
    /// Successful rotations (`rotation_events_total`)
    events: IntCounter,
    /// Failed rotations (`rotation_errors_total`)
    errors: IntCounter,
}

impl RotationStats {
    pub(crate) fn new() -> Self {
        Self {
            ticks: AtomicUsize::new(0),
            events: IntCounter::new("rotation_events_total", "Rotation events")
                .expect("static metric options are valid"),
            errors: IntCounter::new("rotation_errors_total", "Rotation errors")
                .expect("static metric options are valid"),
        }
    }

    /// Register the counters in `registry` so they are exported on `/metrics`
    pub(crate) fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.events.clone()))?;
        registry.register(Box::new(self.errors.clone()))?;
        Ok(())
    }

    pub(crate) fn ticks(&self) -> usize {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Increments the tick counter and returns the previous value
    pub(crate) fn increment_ticks(&self) -> usize {
        self.ticks.fetch_add(1, Ordering::SeqCst)
    }

    pub(crate) fn rotations(&self) -> u64 {
        self.events.get()
    }

    pub(crate) fn increment_rotations(&self) {
        self.events.inc();
    }

    pub(crate) fn errors(&self) -> u64 {
        self.errors.get()
    }

    pub(crate) fn increment_errors(&self) {
        self.errors.inc();
    }
}

/// Metrics recorded by the ClientRefreshProtocol
#[derive(Debug, Clone)]
pub struct RefreshMetrics {
    latency: Histogram,
    results: IntCounterVec,
}

impl RefreshMetrics {
    /// Create the refresh metrics and register them in `registry`
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let latency = Histogram::with_opts(
            HistogramOpts::new(
                "client_refresh_latency_seconds",
                "Time from an unauthenticated response to recovery or giving up",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;
        let results = IntCounterVec::new(
            Opts::new("client_refresh_total", "Client refresh attempts by result"),
            &["result"],
        )?;
        registry.register(Box::new(latency.clone()))?;
        registry.register(Box::new(results.clone()))?;
        Ok(Self { latency, results })
    }

    pub(crate) fn observe(&self, result: &str, latency_secs: f64) {
        self.latency.observe(latency_secs);
        self.results.with_label_values(&[result]).inc();
    }

    /// Number of refreshes that ended with `result`
    pub fn count(&self, result: &str) -> u64 {
        self.results.with_label_values(&[result]).get()
    }
}
