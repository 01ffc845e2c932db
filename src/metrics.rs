// Prometheus metrics for the PawForge gateway
//
// Exposes metrics on the /metrics HTTP endpoint:
// - Admission decisions (counters, denials labelled by quota)
// - Recorded generations (counter)
// - Ledger size and eviction (gauge, counter)
// - Generation latency (histogram)

use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec, Registry, TextEncoder,
};
use std::sync::Arc;

lazy_static! {
    pub static ref REGISTRY: Arc<Registry> = Arc::new(Registry::new());

    // Admission metrics
    pub static ref REQUESTS_ADMITTED_TOTAL: IntCounter = IntCounter::new(
        "requests_admitted_total",
        "Total number of generation requests admitted by the gate"
    ).expect("Failed to create requests admitted metric");

    pub static ref REQUESTS_DENIED_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("requests_denied_total", "Total number of generation requests denied by the gate"),
        &["quota"]
    ).expect("Failed to create requests denied metric");

    pub static ref GENERATIONS_RECORDED_TOTAL: IntCounter = IntCounter::new(
        "generations_recorded_total",
        "Total number of successful generations recorded against quotas"
    ).expect("Failed to create generations recorded metric");

    // Ledger metrics
    pub static ref LEDGER_TRACKED_KEYS: IntGaugeVec = IntGaugeVec::new(
        prometheus::Opts::new("ledger_tracked_keys", "Number of identity keys currently held in a ledger"),
        &["ledger"]
    ).expect("Failed to create ledger tracked keys metric");

    pub static ref LEDGER_KEYS_EVICTED_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("ledger_keys_evicted_total", "Total number of identity keys evicted from a ledger"),
        &["ledger"]
    ).expect("Failed to create ledger keys evicted metric");

    // Generation metrics
    pub static ref GENERATION_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        prometheus::HistogramOpts::new("generation_duration_seconds", "Image generation provider call duration in seconds")
            .buckets(vec![1.0, 2.5, 5.0, 10.0, 20.0, 40.0, 60.0, 120.0]),
        &["status"]
    ).expect("Failed to create generation duration metric");
}

/// Initialize metrics registry - must be called once at startup
pub fn init() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(REQUESTS_ADMITTED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUESTS_DENIED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(GENERATIONS_RECORDED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(LEDGER_TRACKED_KEYS.clone()))?;
    REGISTRY.register(Box::new(LEDGER_KEYS_EVICTED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(GENERATION_DURATION_SECONDS.clone()))?;
    Ok(())
}

/// Gather all metrics in Prometheus text format
pub fn gather_metrics() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))?;
    String::from_utf8(buffer).map_err(|e| anyhow::anyhow!("Invalid UTF-8 in metrics: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_metrics_by_quota() {
        let before = REQUESTS_DENIED_TOTAL
            .with_label_values(&["address_per_hour"])
            .get();
        REQUESTS_DENIED_TOTAL
            .with_label_values(&["address_per_hour"])
            .inc();
        assert!(
            REQUESTS_DENIED_TOTAL
                .with_label_values(&["address_per_hour"])
                .get()
                > before
        );
    }

    #[test]
    fn test_gather_after_init() {
        // Registration fails if another test already ran init, which is fine
        let _ = init();

        REQUESTS_ADMITTED_TOTAL.inc();
        let text = gather_metrics().unwrap();
        assert!(text.contains("requests_admitted_total"));
    }
}
