//! Metric collectors for HTTP, messaging and process statistics

pub mod http;
pub mod messaging;
pub mod system;

pub use http::{HttpMetricsCollector, PrometheusHttpMetrics};
pub use messaging::{MessageClass, MessageMetricsCollector, PrometheusMessageMetrics};
pub use system::{ProcessStats, StatsSample, SysinfoProcessStats, SystemMetricsCollector};

use super::definition::MetricDefinition;
use crate::error::{registration_error, Result};
use prometheus::{HistogramVec, IntCounterVec, IntGaugeVec, Registry};

/// Register one family, mapping failures to the family's fully-qualified name.
pub(crate) fn register<C>(
    registry: &Registry,
    definition: &MetricDefinition,
    namespace: &str,
    collector: C,
) -> Result<()>
where
    C: prometheus::core::Collector + 'static,
{
    register_as(registry, &definition.fq_name(namespace), collector)
}

/// Register a collector, reporting failures under `name`.
pub(crate) fn register_as<C>(registry: &Registry, name: &str, collector: C) -> Result<()>
where
    C: prometheus::core::Collector + 'static,
{
    registry
        .register(Box::new(collector))
        .map_err(|e| registration_error(name, e))?;
    tracing::debug!(metric = %name, "registered metric family");
    Ok(())
}

pub(crate) fn counter_vec(
    registry: &Registry,
    definition: &MetricDefinition,
    namespace: &str,
) -> Result<IntCounterVec> {
    let metric = IntCounterVec::new(definition.opts(namespace), definition.label_names)
        .map_err(|e| registration_error(&definition.fq_name(namespace), e))?;
    register(registry, definition, namespace, metric.clone())?;
    Ok(metric)
}

pub(crate) fn histogram_vec(
    registry: &Registry,
    definition: &MetricDefinition,
    namespace: &str,
) -> Result<HistogramVec> {
    let metric = HistogramVec::new(definition.histogram_opts(namespace), definition.label_names)
        .map_err(|e| registration_error(&definition.fq_name(namespace), e))?;
    register(registry, definition, namespace, metric.clone())?;
    Ok(metric)
}

pub(crate) fn gauge_vec(
    registry: &Registry,
    definition: &MetricDefinition,
    namespace: &str,
) -> Result<IntGaugeVec> {
    let metric = IntGaugeVec::new(definition.opts(namespace), definition.label_names)
        .map_err(|e| registration_error(&definition.fq_name(namespace), e))?;
    register(registry, definition, namespace, metric.clone())?;
    Ok(metric)
}
