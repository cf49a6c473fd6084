//! Process-wide message collector
//!
//! Lifecycle: unset at process start, set once when a registry is made
//! global, then read-only until exit. Code that wraps publish/receive call
//! sites can resolve the collector here instead of threading it through.

use super::collectors::MessageMetricsCollector;
use crate::error::{MetricsError, Result};
use std::sync::{Arc, OnceLock};

static MESSAGE_COLLECTOR: OnceLock<Arc<dyn MessageMetricsCollector>> = OnceLock::new();

/// Publish `collector` as the process-wide message collector.
pub fn set_message_collector(collector: Arc<dyn MessageMetricsCollector>) -> Result<()> {
    MESSAGE_COLLECTOR
        .set(collector)
        .map_err(|_| MetricsError::AlreadyInitialized)
}

/// The process-wide message collector, or [`MetricsError::NotInitialized`].
pub fn message_collector() -> Result<Arc<dyn MessageMetricsCollector>> {
    MESSAGE_COLLECTOR
        .get()
        .cloned()
        .ok_or(MetricsError::NotInitialized)
}
