//! HTTP request metrics

use super::{counter_vec, gauge_vec, histogram_vec};
use crate::error::Result;
use crate::metrics::definition::{
    HTTP_REQUESTS_IN_PROGRESS, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS,
};
use prometheus::{HistogramVec, IntCounterVec, IntGaugeVec, Registry};

/// Capability used by the request hook to record HTTP observations.
///
/// Every distinct `(status_code, method, path)` tuple creates a new series.
/// Callers should pass route templates rather than raw paths where they can.
pub trait HttpMetricsCollector: Send + Sync {
    /// Count one completed request.
    fn inc_request_count(&self, status_code: &str, method: &str, path: &str);

    /// Record one response time sample, in seconds.
    fn observe_response_time(
        &self,
        status_code: &str,
        method: &str,
        path: &str,
        duration_secs: f64,
    );

    /// Mark a request as in flight.
    fn inc_requests_in_progress(&self, method: &str, path: &str);

    /// Mark an in-flight request as finished.
    ///
    /// Must pair with exactly one [`inc_requests_in_progress`](Self::inc_requests_in_progress).
    /// An unmatched call drives the gauge negative; this is not checked.
    fn dec_requests_in_progress(&self, method: &str, path: &str);

    /// Path of the scrape endpoint, excluded from instrumentation.
    fn metrics_url(&self) -> &str;
}

/// Prometheus-backed HTTP metrics
pub struct PrometheusHttpMetrics {
    metrics_url: String,

    /// Completed requests by status code, method and path
    pub requests_total: IntCounterVec,

    /// Request duration by status code, method and path
    pub request_duration_seconds: HistogramVec,

    /// Requests currently being handled, by method and path
    pub requests_in_progress: IntGaugeVec,
}

impl PrometheusHttpMetrics {
    /// Create the HTTP metric families under `namespace` and register them.
    pub fn new(
        registry: &Registry,
        namespace: &str,
        metrics_url: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            metrics_url: metrics_url.into(),
            requests_total: counter_vec(registry, &HTTP_REQUESTS_TOTAL, namespace)?,
            request_duration_seconds: histogram_vec(
                registry,
                &HTTP_REQUEST_DURATION_SECONDS,
                namespace,
            )?,
            requests_in_progress: gauge_vec(registry, &HTTP_REQUESTS_IN_PROGRESS, namespace)?,
        })
    }
}

impl HttpMetricsCollector for PrometheusHttpMetrics {
    fn inc_request_count(&self, status_code: &str, method: &str, path: &str) {
        self.requests_total
            .with_label_values(&[status_code, method, path])
            .inc();
    }

    fn observe_response_time(
        &self,
        status_code: &str,
        method: &str,
        path: &str,
        duration_secs: f64,
    ) {
        self.request_duration_seconds
            .with_label_values(&[status_code, method, path])
            .observe(duration_secs);
    }

    fn inc_requests_in_progress(&self, method: &str, path: &str) {
        self.requests_in_progress
            .with_label_values(&[method, path])
            .inc();
    }

    fn dec_requests_in_progress(&self, method: &str, path: &str) {
        self.requests_in_progress
            .with_label_values(&[method, path])
            .dec();
    }

    fn metrics_url(&self) -> &str {
        &self.metrics_url
    }
}
