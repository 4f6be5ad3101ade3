//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{GENERATE_DURATION_SECONDS, NOTIFICATIONS_GENERATED_TOTAL, STORE_ERRORS_TOTAL};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording generation metrics
pub struct GenerateMetrics;

impl GenerateMetrics {
    /// Record a notification rendered from a template
    pub fn record_template() {
        NOTIFICATIONS_GENERATED_TOTAL.with_label_values(&["template"]).inc();
    }

    /// Record a notification rendered from fallback strings
    pub fn record_fallback() {
        NOTIFICATIONS_GENERATED_TOTAL.with_label_values(&["fallback"]).inc();
    }

    /// Record a failed generation call
    pub fn record_error() {
        NOTIFICATIONS_GENERATED_TOTAL.with_label_values(&["error"]).inc();
    }

    /// Record generation latency
    pub fn observe_duration(elapsed: Duration) {
        GENERATE_DURATION_SECONDS.observe(elapsed.as_secs_f64());
    }
}

/// Helper struct for template store metrics
pub struct StoreMetrics;

impl StoreMetrics {
    /// Record a failed store operation
    pub fn record_error(operation: &str) {
        STORE_ERRORS_TOTAL.with_label_values(&[operation]).inc();
    }
}
