//! Tracing subscriber initialization

use crate::error::{MetricsError, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Log level filter, used when `RUST_LOG` is unset
    pub log_level: String,

    /// Enable JSON format for console
    pub json_format: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_format: false,
        }
    }
}

impl TracingConfig {
    /// Enable JSON format
    pub fn with_json_format(mut self) -> Self {
        self.json_format = true;
        self
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

/// Install a global subscriber writing to the console.
///
/// Returns [`MetricsError::Tracing`] if a global subscriber is already set.
pub fn init_tracing(config: &TracingConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let result = if config.json_format {
        let fmt_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);
        subscriber.with(fmt_layer).try_init()
    } else {
        let fmt_layer = fmt::layer().with_target(true);
        subscriber.with(fmt_layer).try_init()
    };

    result.map_err(|e| MetricsError::Tracing(e.to_string()))
}
