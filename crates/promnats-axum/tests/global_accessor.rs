//! Process-wide message collector lifecycle.
//!
//! The accessor is write-once per process, so the whole lifecycle runs as a
//! single test in its own test binary.

use axum::{routing::get, Router};
use promnats_axum::{
    handler_fn, install, message_collector, publisher_fn, wrap_process_message,
    wrap_process_stream_message, wrap_publish_message, wrap_publish_stream_message, Message,
    MessageClass, MessageHandler, MetricsConfig, MetricsError, MetricsRegistry, Publisher,
};

#[tokio::test]
async fn message_collector_lifecycle() {
    // Unset at process start
    assert!(matches!(message_collector(), Err(MetricsError::NotInitialized)));
    assert!(matches!(
        wrap_process_message(handler_fn(|_msg: Message| async {})),
        Err(MetricsError::NotInitialized)
    ));
    assert!(matches!(
        wrap_publish_message(publisher_fn(|_s: String, _p: Vec<u8>| async {
            Ok::<(), String>(())
        })),
        Err(MetricsError::NotInitialized)
    ));

    // Set exactly once
    let app: Router = Router::new().route("/health", get(|| async { "ok" }));
    let (_app, registry) = install(app, &MetricsConfig::new("Inventory Service")).unwrap();
    assert!(message_collector().is_ok());

    let second = MetricsRegistry::new("other-service", "/metrics").unwrap();
    assert!(matches!(
        second.make_global(),
        Err(MetricsError::AlreadyInitialized)
    ));

    // Wrappers resolve the published collector
    let handler = wrap_process_message(handler_fn(|_msg: Message| async {})).unwrap();
    let stream_handler =
        wrap_process_stream_message(handler_fn(|_msg: Message| async {})).unwrap();
    assert_eq!(handler.class(), MessageClass::Simple);
    assert_eq!(stream_handler.class(), MessageClass::JetStream);

    handler.handle(Message::new("stock.reserved", "1")).await;
    stream_handler.handle(Message::new("stock.reserved", "1")).await;
    stream_handler.handle(Message::new("stock.reserved", "2")).await;

    let publisher = wrap_publish_message(publisher_fn(|_s: String, _p: Vec<u8>| async {
        Ok::<(), String>(())
    }))
    .unwrap();
    let failing = wrap_publish_stream_message(publisher_fn(|_s: String, _p: Vec<u8>| async {
        Err::<(), String>("stream not found".to_string())
    }))
    .unwrap();

    publisher.publish("stock.released", Vec::new()).await.unwrap();
    assert!(failing.publish("stock.released", Vec::new()).await.is_err());

    let output = registry.export().unwrap();
    assert!(output.contains(
        "inventory_service_nats_processed_messages_total{subject=\"stock.reserved\",type=\"simple\"} 1"
    ));
    assert!(output.contains(
        "inventory_service_nats_processed_messages_total{subject=\"stock.reserved\",type=\"jetstream\"} 2"
    ));
    assert!(output.contains(
        "inventory_service_nats_published_messages_total{subject=\"stock.released\",type=\"simple\"} 1"
    ));
    let messaging = registry.messaging();
    assert_eq!(
        messaging
            .published_messages_total
            .with_label_values(&["stock.released", "jetstream"])
            .get(),
        0
    );
}
