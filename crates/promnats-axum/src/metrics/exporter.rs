//! Metrics exporter for Prometheus scraping

use crate::error::{MetricsError, Result};
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, Registry, TextEncoder};
use std::panic::{self, AssertUnwindSafe};

/// Export metrics in Prometheus text format.
///
/// A collector that panics while being gathered fails this scrape with
/// [`MetricsError::ScrapePanicked`] instead of unwinding into the caller.
pub fn export_metrics(registry: &Registry) -> Result<String> {
    let metric_families = panic::catch_unwind(AssertUnwindSafe(|| registry.gather()))
        .map_err(|_| MetricsError::ScrapePanicked)?;

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| MetricsError::Encode(prometheus::Error::Msg(e.to_string())))
}

/// Render `registry` as a scrape response.
///
/// Scrape failures become a `500` for the scraper; the error is logged and
/// never propagated to the serving application.
pub fn scrape_response(registry: &Registry) -> Response {
    match export_metrics(registry) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "metrics scrape failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("metrics scrape failed: {e}"),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::core::{Collector, Desc};
    use prometheus::proto::MetricFamily;
    use prometheus::IntCounter;

    #[test]
    fn test_export_metrics() {
        let registry = Registry::new();
        let counter = IntCounter::new("test_counter", "A test counter").unwrap();
        registry.register(Box::new(counter.clone())).unwrap();
        counter.inc();

        let output = export_metrics(&registry).unwrap();
        assert!(output.contains("# TYPE test_counter counter"));
        assert!(output.contains("test_counter 1"));
    }

    struct PanickingCollector {
        desc: Desc,
    }

    impl Collector for PanickingCollector {
        fn desc(&self) -> Vec<&Desc> {
            vec![&self.desc]
        }

        fn collect(&self) -> Vec<MetricFamily> {
            panic!("collector failure")
        }
    }

    fn panicking_registry() -> Registry {
        let registry = Registry::new();
        let desc = Desc::new("broken".into(), "Always panics".into(), vec![], Default::default())
            .unwrap();
        registry
            .register(Box::new(PanickingCollector { desc }))
            .unwrap();
        registry
    }

    #[test]
    fn test_panicking_collector_fails_the_scrape() {
        let err = export_metrics(&panicking_registry()).unwrap_err();
        assert!(matches!(err, MetricsError::ScrapePanicked));
    }

    #[test]
    fn test_scrape_response_status() {
        let ok = scrape_response(&Registry::new());
        assert_eq!(ok.status(), StatusCode::OK);

        let failed = scrape_response(&panicking_registry());
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
