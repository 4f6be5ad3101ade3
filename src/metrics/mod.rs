//! Prometheus metrics for notification generation.
//!
//! - Generation outcomes (template, fallback, error)
//! - Generation latency
//! - Template store failures

mod helpers;

pub use helpers::{encode_metrics, GenerateMetrics, StoreMetrics};

use lazy_static::lazy_static;
use prometheus::{register_histogram, register_int_counter_vec, Histogram, IntCounterVec};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "copylab";

lazy_static! {
    /// Total generation calls by outcome
    pub static ref NOTIFICATIONS_GENERATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_notifications_generated_total", METRIC_PREFIX),
        "Total notifications generated",
        &["outcome"]
    ).unwrap();

    /// Generation latency in seconds
    pub static ref GENERATE_DURATION_SECONDS: Histogram = register_histogram!(
        format!("{}_generate_duration_seconds", METRIC_PREFIX),
        "Notification generation latency in seconds",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    ).unwrap();

    /// Template store failures by operation
    pub static ref STORE_ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_store_errors_total", METRIC_PREFIX),
        "Total template store errors",
        &["operation"]
    ).unwrap();
}
