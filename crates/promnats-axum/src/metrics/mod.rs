//! Metrics collection and export
//!
//! Provides Prometheus-compatible metrics for HTTP handling, message
//! processing/publishing and process statistics.

pub mod collectors;
pub mod definition;
pub mod exporter;
pub mod global;
pub mod registry;

pub use collectors::{
    HttpMetricsCollector, MessageClass, MessageMetricsCollector, PrometheusHttpMetrics,
    PrometheusMessageMetrics, ProcessStats, StatsSample, SysinfoProcessStats,
    SystemMetricsCollector,
};
pub use definition::MetricDefinition;
pub use exporter::{export_metrics, scrape_response};
pub use global::message_collector;
pub use registry::{MetricsRegistry, MetricsRegistryBuilder, DEFAULT_METRICS_URL};
