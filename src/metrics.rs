//! Prometheus metrics for QR generation.
//!
//! This module provides:
//! - Generated image counts per format
//! - Error counts per error kind
//! - Generation latency per format
//! - HTTP request latency per endpoint

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

use crate::error::ErrorKind;
use crate::qr::OutputFormat;

// === Metric Name Constants ===

/// Generation latency metric name.
pub const METRIC_GENERATION_LATENCY: &str = "qr_generation_latency_ms";
/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Generated images counter metric name.
pub const METRIC_GENERATED: &str = "qr_generated_total";
/// Failed requests counter metric name.
pub const METRIC_ERRORS: &str = "qr_errors_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_GENERATION_LATENCY,
        "Time to encode and render a QR image in milliseconds"
    );
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_counter!(METRIC_GENERATED, "Total number of QR images generated");
    describe_counter!(METRIC_ERRORS, "Total number of QR requests that failed");

    debug!("Metrics initialized");
}

/// Install the Prometheus recorder and return a handle for rendering.
pub fn install_prometheus() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &'static str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint).record(latency_ms);
}

/// Increment generated images counter.
pub fn inc_generated(format: OutputFormat) {
    let format: &'static str = format.into();
    counter!(METRIC_GENERATED, "format" => format).increment(1);
}

/// Increment failed requests counter.
pub fn inc_errors(kind: ErrorKind) {
    let kind: &'static str = kind.into();
    counter!(METRIC_ERRORS, "kind" => kind).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
    format: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric and format label.
    pub fn new(metric_name: &'static str, format: OutputFormat) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
            format: format.into(),
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name, "format" => self.format).record(self.elapsed_ms());
    }
}

/// Create a latency timer for one generation.
pub fn timer_generation(format: OutputFormat) -> LatencyTimer {
    LatencyTimer::new(METRIC_GENERATION_LATENCY, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn latency_timer_measures_time() {
        let timer = timer_generation(OutputFormat::Svg);
        sleep(Duration::from_millis(10));
        let elapsed = timer.elapsed_ms();
        assert!(elapsed >= 9.0); // Allow some tolerance
        // Timer will record on drop
    }

    #[test]
    fn recording_without_a_recorder_is_a_no_op() {
        inc_generated(OutputFormat::Png);
        inc_errors(ErrorKind::MissingParameter);
        record_http_latency(Instant::now(), "/api/qr");
    }
}
