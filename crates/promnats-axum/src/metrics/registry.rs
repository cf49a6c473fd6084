//! Central metrics registry
//!
//! Composes the HTTP, message and system collectors against one shared
//! prometheus [`Registry`] under one normalized namespace.

use super::collectors::{
    HttpMetricsCollector, PrometheusHttpMetrics, PrometheusMessageMetrics, ProcessStats,
    SysinfoProcessStats, SystemMetricsCollector,
};
use super::exporter::export_metrics;
use super::global;
use crate::config::validate_metrics_endpoint;
use crate::error::Result;
use crate::naming::normalize;
use prometheus::Registry;
use std::sync::Arc;

/// Default scrape path
pub const DEFAULT_METRICS_URL: &str = "/metrics";

/// Central metrics registry.
///
/// Built once at startup and shared for the process lifetime; there is no
/// unregistration path.
pub struct MetricsRegistry {
    registry: Registry,
    namespace: String,
    http: Arc<PrometheusHttpMetrics>,
    messaging: Arc<PrometheusMessageMetrics>,
    system: SystemMetricsCollector,
}

impl MetricsRegistry {
    /// Build a registry for `service_name` with a fresh prometheus registry.
    pub fn new(service_name: &str, metrics_url: &str) -> Result<Self> {
        Self::builder(service_name).metrics_url(metrics_url).build()
    }

    /// Create a new builder.
    pub fn builder(service_name: impl Into<String>) -> MetricsRegistryBuilder {
        MetricsRegistryBuilder::new(service_name)
    }

    /// Normalized service name prefixed to every metric
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Path of the scrape endpoint
    pub fn metrics_url(&self) -> &str {
        self.http.metrics_url()
    }

    /// HTTP request metrics
    pub fn http(&self) -> &Arc<PrometheusHttpMetrics> {
        &self.http
    }

    /// Message broker metrics
    pub fn messaging(&self) -> &Arc<PrometheusMessageMetrics> {
        &self.messaging
    }

    /// Process statistics collector
    pub fn system(&self) -> &SystemMetricsCollector {
        &self.system
    }

    /// Get the underlying registry for custom metrics
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> Result<String> {
        export_metrics(&self.registry)
    }

    /// Publish the message collector as the process-wide instance.
    ///
    /// Fails with [`MetricsError::AlreadyInitialized`](crate::MetricsError::AlreadyInitialized)
    /// if another registry already did so.
    pub fn make_global(&self) -> Result<()> {
        global::set_message_collector(self.messaging.clone())
    }
}

/// Builder for [`MetricsRegistry`].
pub struct MetricsRegistryBuilder {
    service_name: String,
    metrics_url: String,
    registry: Option<Registry>,
    stats: Option<Arc<dyn ProcessStats>>,
}

impl MetricsRegistryBuilder {
    fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            metrics_url: DEFAULT_METRICS_URL.to_string(),
            registry: None,
            stats: None,
        }
    }

    /// Set the scrape path (default `/metrics`).
    pub fn metrics_url(mut self, metrics_url: impl Into<String>) -> Self {
        self.metrics_url = metrics_url.into();
        self
    }

    /// Register against an existing prometheus registry instead of a fresh one.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replace the process statistics source.
    pub fn stats_source(mut self, stats: Arc<dyn ProcessStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Create every collector and register each family exactly once.
    ///
    /// A name collision is a startup configuration error and is returned
    /// as [`MetricsError::DuplicateRegistration`](crate::MetricsError::DuplicateRegistration).
    /// A scrape path that cannot be mounted as a route is
    /// [`MetricsError::InvalidConfig`](crate::MetricsError::InvalidConfig).
    pub fn build(self) -> Result<MetricsRegistry> {
        validate_metrics_endpoint(&self.metrics_url)?;
        let namespace = normalize(&self.service_name);
        let registry = self.registry.unwrap_or_default();
        let stats = match self.stats {
            Some(stats) => stats,
            None => Arc::new(SysinfoProcessStats::new()?),
        };

        let http = Arc::new(PrometheusHttpMetrics::new(
            &registry,
            &namespace,
            self.metrics_url.clone(),
        )?);
        let messaging = Arc::new(PrometheusMessageMetrics::new(&registry, &namespace)?);
        let system = SystemMetricsCollector::register(&registry, &namespace, stats)?;

        tracing::debug!(
            namespace = %namespace,
            metrics_url = %self.metrics_url,
            "metrics registry created"
        );

        Ok(MetricsRegistry {
            registry,
            namespace,
            http,
            messaging,
            system,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::collectors::{MessageClass, MessageMetricsCollector, StatsSample};
    use crate::MetricsError;

    struct NoStats;

    impl ProcessStats for NoStats {
        fn sample(&self) -> StatsSample {
            StatsSample::default()
        }
    }

    fn test_registry(service: &str) -> MetricsRegistry {
        MetricsRegistry::builder(service)
            .stats_source(Arc::new(NoStats))
            .build()
            .unwrap()
    }

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new("Order Service", "/metrics").unwrap();
        assert_eq!(registry.namespace(), "order_service");
        assert_eq!(registry.metrics_url(), "/metrics");

        registry.http().inc_request_count("200", "GET", "/orders");
        let output = registry.export().unwrap();
        assert!(output.contains("order_service_http_requests_total"));
    }

    #[test]
    fn test_all_subsystems_share_one_namespace() {
        let registry = test_registry("billing-api");
        registry.http().inc_requests_in_progress("GET", "/invoices");
        registry
            .messaging()
            .inc_published_message_count("invoices.paid", MessageClass::Simple);

        let output = registry.export().unwrap();
        assert!(output.contains("billing_api_http_requests_in_progress_total"));
        assert!(output.contains(
            "billing_api_nats_published_messages_total{subject=\"invoices.paid\",type=\"simple\"} 1"
        ));
    }

    #[test]
    fn test_custom_metrics_url() {
        let registry = MetricsRegistry::builder("svc")
            .metrics_url("/internal/metrics")
            .stats_source(Arc::new(NoStats))
            .build()
            .unwrap();
        assert_eq!(registry.metrics_url(), "/internal/metrics");
    }

    #[test]
    fn test_unroutable_metrics_url_is_rejected() {
        for url in ["", "metrics"] {
            let err = MetricsRegistry::builder("svc")
                .metrics_url(url)
                .stats_source(Arc::new(NoStats))
                .build()
                .err()
                .unwrap();
            assert!(matches!(err, MetricsError::InvalidConfig(_)));
        }
    }

    #[test]
    fn test_same_namespace_on_shared_registry_fails() {
        let shared = Registry::new();
        MetricsRegistry::builder("orders")
            .registry(shared.clone())
            .stats_source(Arc::new(NoStats))
            .build()
            .unwrap();

        let err = MetricsRegistry::builder("Orders")
            .registry(shared)
            .stats_source(Arc::new(NoStats))
            .build()
            .err()
            .unwrap();
        match err {
            MetricsError::DuplicateRegistration(name) => {
                assert_eq!(name, "orders_http_requests_total")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_distinct_namespaces_share_a_registry() {
        let shared = Registry::new();
        for service in ["orders", "billing"] {
            MetricsRegistry::builder(service)
                .registry(shared.clone())
                .stats_source(Arc::new(NoStats))
                .build()
                .unwrap();
        }
    }
}
