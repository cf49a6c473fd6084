//! Message processing and publishing instrumentation
//!
//! The broker client itself stays outside this crate. Applications adapt
//! their subscription callbacks to [`MessageHandler`] and their publish
//! calls to [`Publisher`], then wrap them:
//!
//! ```ignore
//! let handler = InstrumentedHandler::new(
//!     handler_fn(|msg: Message| async move { process(msg).await }),
//!     registry.messaging().clone(),
//!     MessageClass::Simple,
//! );
//! ```

use crate::error::Result;
use crate::metrics::collectors::{MessageClass, MessageMetricsCollector};
use crate::metrics::global;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// A delivered message: subject plus raw payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(subject: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            subject: subject.into(),
            payload: payload.into(),
        }
    }
}

/// Callback run for each received message.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: Message);
}

/// Raw publish operation of a broker client.
#[async_trait]
pub trait Publisher: Send + Sync {
    type Error: Send;

    async fn publish(
        &self,
        subject: &str,
        payload: Vec<u8>,
    ) -> std::result::Result<(), Self::Error>;
}

/// [`MessageHandler`] backed by an async closure, see [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Turn an async closure into a [`MessageHandler`].
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    HandlerFn { f }
}

#[async_trait]
impl<F, Fut> MessageHandler for HandlerFn<F>
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn handle(&self, message: Message) {
        (self.f)(message).await
    }
}

/// [`Publisher`] backed by an async closure, see [`publisher_fn`].
#[derive(Clone)]
pub struct PublisherFn<F> {
    f: F,
}

/// Turn an async `(subject, payload)` closure into a [`Publisher`].
pub fn publisher_fn<F, Fut, E>(f: F) -> PublisherFn<F>
where
    F: Fn(String, Vec<u8>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<(), E>> + Send + 'static,
    E: Send + 'static,
{
    PublisherFn { f }
}

#[async_trait]
impl<F, Fut, E> Publisher for PublisherFn<F>
where
    F: Fn(String, Vec<u8>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<(), E>> + Send + 'static,
    E: Send + 'static,
{
    type Error = E;

    async fn publish(&self, subject: &str, payload: Vec<u8>) -> std::result::Result<(), E> {
        (self.f)(subject.to_owned(), payload).await
    }
}

/// Handler that records one processed count and one duration sample per
/// message after the inner handler returns.
pub struct InstrumentedHandler<H> {
    inner: H,
    collector: Arc<dyn MessageMetricsCollector>,
    class: MessageClass,
}

impl<H> InstrumentedHandler<H> {
    pub fn new(inner: H, collector: Arc<dyn MessageMetricsCollector>, class: MessageClass) -> Self {
        Self {
            inner,
            collector,
            class,
        }
    }

    pub fn class(&self) -> MessageClass {
        self.class
    }

    pub fn into_inner(self) -> H {
        self.inner
    }
}

#[async_trait]
impl<H: MessageHandler> MessageHandler for InstrumentedHandler<H> {
    async fn handle(&self, message: Message) {
        let subject = message.subject.clone();
        let start = Instant::now();

        self.inner.handle(message).await;

        self.collector
            .inc_processed_message_count(&subject, self.class);
        self.collector.observe_message_processing_duration(
            &subject,
            self.class,
            start.elapsed().as_secs_f64(),
        );
    }
}

/// Publisher that records a published count and duration sample only when
/// the inner publish succeeds. Failures are returned unchanged.
pub struct InstrumentedPublisher<P> {
    inner: P,
    collector: Arc<dyn MessageMetricsCollector>,
    class: MessageClass,
}

impl<P> InstrumentedPublisher<P> {
    pub fn new(inner: P, collector: Arc<dyn MessageMetricsCollector>, class: MessageClass) -> Self {
        Self {
            inner,
            collector,
            class,
        }
    }

    pub fn class(&self) -> MessageClass {
        self.class
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

#[async_trait]
impl<P: Publisher> Publisher for InstrumentedPublisher<P> {
    type Error = P::Error;

    async fn publish(&self, subject: &str, payload: Vec<u8>) -> std::result::Result<(), P::Error> {
        let start = Instant::now();

        if let Err(e) = self.inner.publish(subject, payload).await {
            tracing::debug!(subject, class = %self.class, "publish failed, not counted");
            return Err(e);
        }

        self.collector
            .inc_published_message_count(subject, self.class);
        self.collector.observe_message_publishing_duration(
            subject,
            self.class,
            start.elapsed().as_secs_f64(),
        );
        Ok(())
    }
}

/// Wrap a core (fire-and-forget) subscription handler using the process-wide
/// collector.
///
/// Fails with [`MetricsError::NotInitialized`](crate::MetricsError::NotInitialized)
/// when no registry has been made global yet.
pub fn wrap_process_message<H: MessageHandler>(handler: H) -> Result<InstrumentedHandler<H>> {
    wrap_handler(handler, MessageClass::Simple)
}

/// Wrap a JetStream consumer handler using the process-wide collector.
pub fn wrap_process_stream_message<H: MessageHandler>(
    handler: H,
) -> Result<InstrumentedHandler<H>> {
    wrap_handler(handler, MessageClass::JetStream)
}

/// Wrap a core publish operation using the process-wide collector.
pub fn wrap_publish_message<P: Publisher>(publisher: P) -> Result<InstrumentedPublisher<P>> {
    wrap_publisher(publisher, MessageClass::Simple)
}

/// Wrap a JetStream publish operation using the process-wide collector.
pub fn wrap_publish_stream_message<P: Publisher>(publisher: P) -> Result<InstrumentedPublisher<P>> {
    wrap_publisher(publisher, MessageClass::JetStream)
}

fn wrap_handler<H: MessageHandler>(
    handler: H,
    class: MessageClass,
) -> Result<InstrumentedHandler<H>> {
    let collector = global::message_collector()?;
    Ok(InstrumentedHandler::new(handler, collector, class))
}

fn wrap_publisher<P: Publisher>(
    publisher: P,
    class: MessageClass,
) -> Result<InstrumentedPublisher<P>> {
    let collector = global::message_collector()?;
    Ok(InstrumentedPublisher::new(publisher, collector, class))
}
