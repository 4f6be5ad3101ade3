//! Timing and outcome logging around a [`NotificationGenerator`].

use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::metrics::GenerateMetrics;

use super::assembler::NotificationGenerator;
use super::types::{GenerateRequest, GenerateResult, RenderedNotification};

/// Wraps a generator with debug/slow-call logging and Prometheus metrics.
pub struct Instrumented<G> {
    inner: G,
    slow_threshold: Duration,
}

impl<G: NotificationGenerator> Instrumented<G> {
    pub fn new(inner: G, slow_threshold: Duration) -> Self {
        Self {
            inner,
            slow_threshold,
        }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }
}

#[async_trait]
impl<G: NotificationGenerator> NotificationGenerator for Instrumented<G> {
    async fn generate(&self, request: &GenerateRequest) -> GenerateResult<RenderedNotification> {
        tracing::debug!(placement_id = %request.placement_id, "Generating notification");
        let start = Instant::now();

        let result = self.inner.generate(request).await;

        let elapsed = start.elapsed();
        let elapsed_ms = (elapsed.as_secs_f64() * 100_000.0).round() / 100.0;
        GenerateMetrics::observe_duration(elapsed);

        match &result {
            Ok(rendered) => {
                if rendered.template_used {
                    GenerateMetrics::record_template();
                } else {
                    GenerateMetrics::record_fallback();
                }
                tracing::debug!(
                    placement_id = %request.placement_id,
                    elapsed_ms,
                    template_used = rendered.template_used,
                    template_name = rendered.template_name.as_deref().unwrap_or("-"),
                    "Notification generated"
                );
            }
            Err(e) => {
                GenerateMetrics::record_error();
                tracing::error!(
                    placement_id = %request.placement_id,
                    elapsed_ms,
                    error = %e,
                    "Notification generation failed"
                );
            }
        }

        if elapsed > self.slow_threshold {
            tracing::warn!(
                placement_id = %request.placement_id,
                elapsed_ms,
                threshold_ms = self.slow_threshold.as_millis() as u64,
                "Slow notification generation"
            );
        }

        result
    }
}
