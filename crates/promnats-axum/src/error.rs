//! Error types for promnats-axum

use thiserror::Error;

/// Errors that can occur while building, wiring or scraping the metrics subsystem
#[derive(Debug, Error)]
pub enum MetricsError {
    /// A metric family with this fully-qualified name is already registered
    #[error("Metric family already registered: {0}")]
    DuplicateRegistration(String),

    /// Any other failure while creating or registering a metric family
    #[error("Failed to register metric family {name}: {source}")]
    Registration {
        /// Fully-qualified metric name
        name: String,
        #[source]
        source: prometheus::Error,
    },

    /// Invalid metrics configuration
    #[error("Invalid metrics configuration: {0}")]
    InvalidConfig(String),

    /// The process-wide message collector was requested before the registry published it
    #[error("Message metrics collector is not initialized")]
    NotInitialized,

    /// The process-wide message collector has already been published
    #[error("Message metrics collector is already initialized")]
    AlreadyInitialized,

    /// The process statistics source could not be created
    #[error("Process statistics unavailable: {0}")]
    StatsUnavailable(String),

    /// Encoding the registry into the exposition format failed
    #[error("Failed to encode metrics: {0}")]
    Encode(#[from] prometheus::Error),

    /// A collector panicked while the registry was being gathered
    #[error("A collector panicked during the scrape")]
    ScrapePanicked,

    /// Tracing subscriber initialization failed
    #[error("Tracing error: {0}")]
    Tracing(String),
}

/// Result type alias for metrics operations
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Map a registration failure for the family `name` onto [`MetricsError`].
pub(crate) fn registration_error(name: &str, error: prometheus::Error) -> MetricsError {
    match error {
        prometheus::Error::AlreadyReg => MetricsError::DuplicateRegistration(name.to_string()),
        source => MetricsError::Registration {
            name: name.to_string(),
            source,
        },
    }
}
