//! Instrumentation wrappers for HTTP requests and broker messages

pub mod http;
pub mod messaging;

pub use http::{http_metrics_middleware, instrument_request, ResponseStatus};
pub use messaging::{
    handler_fn, publisher_fn, wrap_process_message, wrap_process_stream_message,
    wrap_publish_message, wrap_publish_stream_message, HandlerFn, InstrumentedHandler,
    InstrumentedPublisher, Message, MessageHandler, Publisher, PublisherFn,
};
