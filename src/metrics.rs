//! Metrics collection and export module

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::time::Instant;

/// Global metrics registry
pub struct Metrics {
    registry: Registry,

    // Counters
    pub casts_total: IntCounter,
    pub casts_success: IntCounter,
    pub casts_failed: IntCounter,
    pub casts_timed_out: IntCounter,
    pub fish_caught: IntCounter,
    pub cast_errors: IntCounterVec,

    // Gauges
    pub last_cast_count: IntGauge,

    // Histograms
    pub cast_latency: Histogram,
    pub build_latency: Histogram,
    pub confirm_polls: Histogram,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let casts_total =
            IntCounter::with_opts(Opts::new("casts_total", "Total number of cast attempts"))?;

        let casts_success =
            IntCounter::with_opts(Opts::new("casts_success", "Number of confirmed casts"))?;

        let casts_failed = IntCounter::with_opts(Opts::new(
            "casts_failed",
            "Number of casts that were not confirmed",
        ))?;

        let casts_timed_out = IntCounter::with_opts(Opts::new(
            "casts_timed_out",
            "Number of casts whose confirmation window ran out",
        ))?;

        let fish_caught = IntCounter::with_opts(Opts::new(
            "fish_caught_raw_total",
            "Fish caught by confirmed casts, in raw units",
        ))?;

        let cast_errors = IntCounterVec::new(
            Opts::new("cast_errors_total", "Cast attempt errors by category"),
            &["category"],
        )?;

        let last_cast_count = IntGauge::with_opts(Opts::new(
            "player_cast_count",
            "Most recently observed on-chain cast count",
        ))?;

        let cast_latency = Histogram::with_opts(
            HistogramOpts::new("cast_latency_seconds", "Submit to confirmation latency")
                .buckets(vec![0.5, 1.0, 2.0, 3.0, 5.0, 8.0, 10.0]),
        )?;

        let build_latency = Histogram::with_opts(
            HistogramOpts::new("build_latency_seconds", "Transaction assembly latency")
                .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01]),
        )?;

        let confirm_polls = Histogram::with_opts(
            HistogramOpts::new("confirm_polls", "Polls needed to observe confirmation")
                .buckets(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]),
        )?;

        registry.register(Box::new(casts_total.clone()))?;
        registry.register(Box::new(casts_success.clone()))?;
        registry.register(Box::new(casts_failed.clone()))?;
        registry.register(Box::new(casts_timed_out.clone()))?;
        registry.register(Box::new(fish_caught.clone()))?;
        registry.register(Box::new(cast_errors.clone()))?;
        registry.register(Box::new(last_cast_count.clone()))?;
        registry.register(Box::new(cast_latency.clone()))?;
        registry.register(Box::new(build_latency.clone()))?;
        registry.register(Box::new(confirm_polls.clone()))?;

        Ok(Self {
            registry,
            casts_total,
            casts_success,
            casts_failed,
            casts_timed_out,
            fish_caught,
            cast_errors,
            last_cast_count,
            cast_latency,
            build_latency,
            confirm_polls,
        })
    }

    pub fn record_error(&self, category: &str) {
        self.cast_errors.with_label_values(&[category]).inc();
    }

    /// Prometheus text exposition of every registered metric
    pub fn encode_text(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> =
        once_cell::sync::Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
    &METRICS
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
