//! Configuration for the metrics subsystem

use crate::error::{MetricsError, Result};
use crate::metrics::DEFAULT_METRICS_URL;
use serde::{Deserialize, Serialize};

/// Metrics configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Service name; normalized into the metric namespace
    pub service_name: String,

    /// Path the scrape endpoint is mounted at
    #[serde(default = "default_metrics_endpoint")]
    pub metrics_endpoint: String,
}

fn default_metrics_endpoint() -> String {
    DEFAULT_METRICS_URL.to_string()
}

impl MetricsConfig {
    /// Create config for a specific service
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            metrics_endpoint: default_metrics_endpoint(),
        }
    }

    /// Set the scrape path
    pub fn with_metrics_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.metrics_endpoint = endpoint.into();
        self
    }

    /// Check that the scrape path can be mounted as a route.
    pub fn validate(&self) -> Result<()> {
        validate_metrics_endpoint(&self.metrics_endpoint)
    }
}

pub(crate) fn validate_metrics_endpoint(endpoint: &str) -> Result<()> {
    if endpoint.is_empty() {
        return Err(MetricsError::InvalidConfig(
            "metrics_endpoint must not be empty".to_string(),
        ));
    }
    if !endpoint.starts_with('/') {
        return Err(MetricsError::InvalidConfig(format!(
            "metrics_endpoint must start with '/': {endpoint}"
        )));
    }
    Ok(())
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self::new("service")
    }
}
