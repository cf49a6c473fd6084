//! Metric family definitions
//!
//! Every family exposed by this crate is described by a [`MetricDefinition`]
//! constant. The fully-qualified name is
//! `{namespace}_{subsystem}_{name}`, empty parts skipped.

use prometheus::{HistogramOpts, Opts, DEFAULT_BUCKETS};

/// Subsystem for HTTP request metrics
pub const HTTP_SUBSYSTEM: &str = "http";
/// Subsystem for message broker metrics
pub const NATS_SUBSYSTEM: &str = "nats";
/// Subsystem for process statistics
pub const SYSTEM_SUBSYSTEM: &str = "system";

pub const STATUS_CODE_LABEL: &str = "status_code";
pub const METHOD_LABEL: &str = "method";
pub const PATH_LABEL: &str = "path";
pub const SUBJECT_LABEL: &str = "subject";
pub const TYPE_LABEL: &str = "type";

/// Identity of one metric family. Fixed at collector construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDefinition {
    pub subsystem: &'static str,
    pub name: &'static str,
    pub help: &'static str,
    pub label_names: &'static [&'static str],
}

impl MetricDefinition {
    /// Fully-qualified name under `namespace`.
    pub fn fq_name(&self, namespace: &str) -> String {
        [namespace, self.subsystem, self.name]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Counter/gauge options under `namespace`.
    pub fn opts(&self, namespace: &str) -> Opts {
        Opts::new(self.name, self.help)
            .namespace(namespace)
            .subsystem(self.subsystem)
    }

    /// Histogram options under `namespace` with the default exposition buckets.
    pub fn histogram_opts(&self, namespace: &str) -> HistogramOpts {
        HistogramOpts::from(self.opts(namespace)).buckets(DEFAULT_BUCKETS.to_vec())
    }
}

pub const HTTP_REQUESTS_TOTAL: MetricDefinition = MetricDefinition {
    subsystem: HTTP_SUBSYSTEM,
    name: "requests_total",
    help: "Total number of HTTP requests.",
    label_names: &[STATUS_CODE_LABEL, METHOD_LABEL, PATH_LABEL],
};

pub const HTTP_REQUEST_DURATION_SECONDS: MetricDefinition = MetricDefinition {
    subsystem: HTTP_SUBSYSTEM,
    name: "request_duration_seconds",
    help: "Duration of HTTP requests.",
    label_names: &[STATUS_CODE_LABEL, METHOD_LABEL, PATH_LABEL],
};

pub const HTTP_REQUESTS_IN_PROGRESS: MetricDefinition = MetricDefinition {
    subsystem: HTTP_SUBSYSTEM,
    name: "requests_in_progress_total",
    help: "Number of HTTP requests in progress.",
    label_names: &[METHOD_LABEL, PATH_LABEL],
};

pub const NATS_PROCESSED_MESSAGES_TOTAL: MetricDefinition = MetricDefinition {
    subsystem: NATS_SUBSYSTEM,
    name: "processed_messages_total",
    help: "Total number of NATS messages processed.",
    label_names: &[SUBJECT_LABEL, TYPE_LABEL],
};

pub const NATS_MESSAGE_PROCESSING_DURATION: MetricDefinition = MetricDefinition {
    subsystem: NATS_SUBSYSTEM,
    name: "message_processing_duration_seconds",
    help: "Duration of NATS message processing.",
    label_names: &[SUBJECT_LABEL, TYPE_LABEL],
};

pub const NATS_PUBLISHED_MESSAGES_TOTAL: MetricDefinition = MetricDefinition {
    subsystem: NATS_SUBSYSTEM,
    name: "published_messages_total",
    help: "Total number of NATS messages published.",
    label_names: &[SUBJECT_LABEL, TYPE_LABEL],
};

pub const NATS_PUBLISHING_MESSAGE_DURATION: MetricDefinition = MetricDefinition {
    subsystem: NATS_SUBSYSTEM,
    name: "publishing_message_duration_seconds",
    help: "Duration of NATS message publishing.",
    label_names: &[SUBJECT_LABEL, TYPE_LABEL],
};

pub const SYSTEM_CPU_USAGE_PERCENT: MetricDefinition = MetricDefinition {
    subsystem: SYSTEM_SUBSYSTEM,
    name: "system_cpu_usage_percent",
    help: "CPU usage as a percentage.",
    label_names: &[],
};

pub const SYSTEM_MEMORY_USAGE_BYTES: MetricDefinition = MetricDefinition {
    subsystem: SYSTEM_SUBSYSTEM,
    name: "system_memory_usage_bytes",
    help: "Memory usage in bytes.",
    label_names: &[],
};

pub const SYSTEM_MEMORY_TOTAL_BYTES: MetricDefinition = MetricDefinition {
    subsystem: SYSTEM_SUBSYSTEM,
    name: "system_memory_total_bytes",
    help: "Total memory in bytes.",
    label_names: &[],
};

pub const SYSTEM_GC_STATS: MetricDefinition = MetricDefinition {
    subsystem: SYSTEM_SUBSYSTEM,
    name: "system_gc_stats",
    help: "GC stats.",
    label_names: &[],
};

pub const SYSTEM_WORKER_COUNT: MetricDefinition = MetricDefinition {
    subsystem: SYSTEM_SUBSYSTEM,
    name: "system_worker_count",
    help: "Number of live async tasks.",
    label_names: &[],
};
