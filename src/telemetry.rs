use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, Histogram,
    HistogramVec, IntCounterVec, IntGauge, TextEncoder,
};
use std::time::Instant;

use crate::error::Backend;
use crate::Result;

lazy_static! {
    pub static ref SERVICE_UP: IntGauge = register_int_gauge!(
        "gce_metrics_up",
        "Whether the service is up (1) or down (0)"
    ).unwrap();

    // Request metrics
    pub static ref REQUESTS: IntCounterVec = register_int_counter_vec!(
        "gce_metrics_requests_total",
        "Total number of requests received",
        &["endpoint"]
    ).unwrap();

    pub static ref REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "gce_metrics_request_duration_seconds",
        "Request duration in seconds",
        &["endpoint"],
        vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]
    ).unwrap();

    // Backend metrics
    pub static ref BACKEND_QUERIES: IntCounterVec = register_int_counter_vec!(
        "gce_metrics_backend_queries_total",
        "Total number of backend page requests issued",
        &["backend"]
    ).unwrap();

    pub static ref BACKEND_FAILURES: IntCounterVec = register_int_counter_vec!(
        "gce_metrics_backend_failures_total",
        "Total number of failed backend requests",
        &["backend"]
    ).unwrap();

    pub static ref PARTIAL_FAILURES: IntCounterVec = register_int_counter_vec!(
        "gce_metrics_partial_failures_total",
        "Metrics replaced by an empty mapping under the partial-success policy",
        &["metric"]
    ).unwrap();
}

pub fn init_telemetry() {
    SERVICE_UP.set(1);
}

/// Counts a request to `endpoint` and observes its duration when dropped.
pub struct RequestTimer {
    start: Instant,
    duration: Histogram,
}

impl RequestTimer {
    pub fn new(endpoint: &str) -> Self {
        REQUESTS.with_label_values(&[endpoint]).inc();
        Self {
            start: Instant::now(),
            duration: REQUEST_DURATION.with_label_values(&[endpoint]),
        }
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        self.duration.observe(self.start.elapsed().as_secs_f64());
    }
}

pub fn record_backend_query(backend: Backend) {
    BACKEND_QUERIES.with_label_values(&[backend.as_str()]).inc();
}

pub fn record_backend_failure(backend: Backend) {
    BACKEND_FAILURES.with_label_values(&[backend.as_str()]).inc();
}

pub fn record_partial_failure(metric: &str) {
    PARTIAL_FAILURES.with_label_values(&[metric]).inc();
}

/// Renders the default registry in the Prometheus text format.
pub fn render() -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;

    String::from_utf8(buffer)
        .map_err(|e| crate::MetricsServiceError::Internal(format!("Invalid telemetry encoding: {}", e)))
}
