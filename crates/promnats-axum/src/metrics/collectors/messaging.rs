//! Message broker metrics

use super::{counter_vec, histogram_vec};
use crate::error::Result;
use crate::metrics::definition::{
    NATS_MESSAGE_PROCESSING_DURATION, NATS_PROCESSED_MESSAGES_TOTAL,
    NATS_PUBLISHED_MESSAGES_TOTAL, NATS_PUBLISHING_MESSAGE_DURATION,
};
use prometheus::{HistogramVec, IntCounterVec, Registry};
use std::fmt;

/// Delivery semantics of a message, used as the `type` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageClass {
    /// Core NATS, fire-and-forget
    Simple,
    /// JetStream, durable/streamed
    JetStream,
}

impl MessageClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageClass::Simple => "simple",
            MessageClass::JetStream => "jetstream",
        }
    }
}

impl fmt::Display for MessageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability used by the message wrappers to record broker observations.
///
/// Series are keyed by `(subject, type)`; every distinct subject creates a new
/// series, so wildcard-heavy subject spaces should be instrumented with care.
pub trait MessageMetricsCollector: Send + Sync {
    fn inc_processed_message_count(&self, subject: &str, class: MessageClass);

    fn observe_message_processing_duration(
        &self,
        subject: &str,
        class: MessageClass,
        duration_secs: f64,
    );

    fn inc_published_message_count(&self, subject: &str, class: MessageClass);

    fn observe_message_publishing_duration(
        &self,
        subject: &str,
        class: MessageClass,
        duration_secs: f64,
    );
}

/// Prometheus-backed message broker metrics
pub struct PrometheusMessageMetrics {
    /// Messages handled by subscribers
    pub processed_messages_total: IntCounterVec,

    /// Time spent in subscriber handlers
    pub message_processing_duration_seconds: HistogramVec,

    /// Messages successfully published
    pub published_messages_total: IntCounterVec,

    /// Time spent in successful publish calls
    pub publishing_message_duration_seconds: HistogramVec,
}

impl PrometheusMessageMetrics {
    /// Create the message metric families under `namespace` and register them.
    pub fn new(registry: &Registry, namespace: &str) -> Result<Self> {
        let processed_messages_total =
            counter_vec(registry, &NATS_PROCESSED_MESSAGES_TOTAL, namespace)?;
        let message_processing_duration_seconds =
            histogram_vec(registry, &NATS_MESSAGE_PROCESSING_DURATION, namespace)?;
        let published_messages_total =
            counter_vec(registry, &NATS_PUBLISHED_MESSAGES_TOTAL, namespace)?;
        let publishing_message_duration_seconds =
            histogram_vec(registry, &NATS_PUBLISHING_MESSAGE_DURATION, namespace)?;

        Ok(Self {
            processed_messages_total,
            message_processing_duration_seconds,
            published_messages_total,
            publishing_message_duration_seconds,
        })
    }
}

impl MessageMetricsCollector for PrometheusMessageMetrics {
    fn inc_processed_message_count(&self, subject: &str, class: MessageClass) {
        self.processed_messages_total
            .with_label_values(&[subject, class.as_str()])
            .inc();
    }

    fn observe_message_processing_duration(
        &self,
        subject: &str,
        class: MessageClass,
        duration_secs: f64,
    ) {
        self.message_processing_duration_seconds
            .with_label_values(&[subject, class.as_str()])
            .observe(duration_secs);
    }

    fn inc_published_message_count(&self, subject: &str, class: MessageClass) {
        self.published_messages_total
            .with_label_values(&[subject, class.as_str()])
            .inc();
    }

    fn observe_message_publishing_duration(
        &self,
        subject: &str,
        class: MessageClass,
        duration_secs: f64,
    ) {
        self.publishing_message_duration_seconds
            .with_label_values(&[subject, class.as_str()])
            .observe(duration_secs);
    }
}
