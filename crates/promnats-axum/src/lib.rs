//! promnats-axum
//!
//! Prometheus metrics for services that handle HTTP requests with axum and
//! process or publish messages on NATS.
//!
//! ## Features
//!
//! - **HTTP**: request count, duration and in-flight gauge per status code, method and route
//! - **Messaging**: processed/published message counts and durations per subject and delivery type
//! - **System**: process CPU, resident memory, host memory, GC pauses and live worker count,
//!   sampled on scrape
//! - **Export**: Prometheus text exposition served from a configurable path
//!
//! All metric names follow `{service}_{subsystem}_{name}` where the service
//! name is normalized by [`normalize`] and the subsystem is `http`, `nats` or
//! `system`.

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod naming;
pub mod router;
pub mod telemetry;

pub use config::MetricsConfig;
pub use error::{MetricsError, Result};
pub use metrics::{
    message_collector, HttpMetricsCollector, MessageClass, MessageMetricsCollector,
    MetricsRegistry, MetricsRegistryBuilder, ProcessStats, StatsSample, DEFAULT_METRICS_URL,
};
pub use middleware::{
    handler_fn, http_metrics_middleware, instrument_request, publisher_fn, wrap_process_message,
    wrap_process_stream_message, wrap_publish_message, wrap_publish_stream_message,
    InstrumentedHandler, InstrumentedPublisher, Message, MessageHandler, Publisher,
};
pub use naming::normalize;
pub use router::{install, instrument};
pub use telemetry::{init_tracing, TracingConfig};
