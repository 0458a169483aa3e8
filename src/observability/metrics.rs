use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Histogram, HistogramOpts, IntGauge, Opts, Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Upstream metrics
    pub static ref FETCH_ATTEMPTS: Counter = Counter::new(
        "funding_fetch_attempts_total",
        "Total number of funding rate fetch attempts"
    ).unwrap();

    pub static ref FETCH_RETRIES: Counter = Counter::new(
        "funding_fetch_retries_total",
        "Total number of retried funding rate fetch attempts"
    ).unwrap();

    pub static ref FETCH_FAILURES: Counter = Counter::new(
        "funding_fetch_failures_total",
        "Total number of fetches that exhausted their retries"
    ).unwrap();

    pub static ref FETCH_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "funding_fetch_latency_seconds",
            "Latency of successful funding rate fetches"
        ).buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0])
    ).unwrap();

    // Cache metrics
    pub static ref CACHE_PUBLISHES: Counter = Counter::new(
        "rate_cache_publishes_total",
        "Total number of cache snapshots published"
    ).unwrap();

    pub static ref CACHE_ENTRIES: IntGauge = IntGauge::new(
        "rate_cache_entries",
        "Entries in the current cache snapshot"
    ).unwrap();

    // Alert metrics
    pub static ref ALERT_CYCLES: CounterVec = CounterVec::new(
        Opts::new("alert_cycles_total", "Scheduled alert cycles by outcome"),
        &["outcome"]
    ).unwrap();

    pub static ref ALERTS_SENT: Counter = Counter::new(
        "alerts_sent_total",
        "Total number of alert messages delivered"
    ).unwrap();

    pub static ref DISPATCH_FAILURES: Counter = Counter::new(
        "alert_dispatch_failures_total",
        "Total number of alert messages that failed to send"
    ).unwrap();

    // Command metrics
    pub static ref COMMANDS_HANDLED: CounterVec = CounterVec::new(
        Opts::new("commands_handled_total", "Inbound chat commands by kind"),
        &["command"]
    ).unwrap();
}

pub fn register_metrics() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(FETCH_ATTEMPTS.clone()))?;
    REGISTRY.register(Box::new(FETCH_RETRIES.clone()))?;
    REGISTRY.register(Box::new(FETCH_FAILURES.clone()))?;
    REGISTRY.register(Box::new(FETCH_LATENCY.clone()))?;
    REGISTRY.register(Box::new(CACHE_PUBLISHES.clone()))?;
    REGISTRY.register(Box::new(CACHE_ENTRIES.clone()))?;
    REGISTRY.register(Box::new(ALERT_CYCLES.clone()))?;
    REGISTRY.register(Box::new(ALERTS_SENT.clone()))?;
    REGISTRY.register(Box::new(DISPATCH_FAILURES.clone()))?;
    REGISTRY.register(Box::new(COMMANDS_HANDLED.clone()))?;
    Ok(())
}

/// Prometheus text exposition of the crate registry.
pub fn render() -> String {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}
