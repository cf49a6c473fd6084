//! Axum integration
//!
//! [`install`] is the one-call setup: it builds the registry from a
//! [`MetricsConfig`], mounts the scrape route, installs the request hook and
//! publishes the message collector for the `wrap_*` functions.
//!
//! ```ignore
//! use axum::{routing::get, Router};
//! use promnats_axum::{install, MetricsConfig};
//!
//! let app = Router::new().route("/orders/:id", get(get_order));
//! let (app, metrics) = install(app, &MetricsConfig::new("order-service"))?;
//! ```

use crate::config::MetricsConfig;
use crate::error::Result;
use crate::metrics::collectors::HttpMetricsCollector;
use crate::metrics::exporter::scrape_response;
use crate::metrics::registry::MetricsRegistry;
use crate::middleware::http::http_metrics_middleware;
use axum::{middleware, routing::get, Router};
use std::sync::Arc;

/// Mount the scrape route and the request hook for `registry` on `router`.
///
/// Only routes already added to `router` are instrumented. The process-wide
/// message collector is left untouched.
///
/// Panics, as [`Router::route`] does, if `router` already has a route at the
/// scrape path. The scrape path itself is checked when the registry is built.
pub fn instrument<S>(router: Router<S>, registry: &Arc<MetricsRegistry>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let for_scrape = registry.clone();
    let collector: Arc<dyn HttpMetricsCollector> = registry.http().clone();

    router
        .route(
            registry.metrics_url(),
            get(move || {
                let registry = for_scrape.clone();
                async move { scrape_response(registry.registry()) }
            }),
        )
        .layer(middleware::from_fn_with_state(
            collector,
            http_metrics_middleware,
        ))
}

/// Build a registry from `config`, instrument `router` with it and make it
/// the process-wide registry.
///
/// Errors are startup configuration errors: an invalid config, a metric
/// name collision, or a registry that was already made global.
pub fn install<S>(
    router: Router<S>,
    config: &MetricsConfig,
) -> Result<(Router<S>, Arc<MetricsRegistry>)>
where
    S: Clone + Send + Sync + 'static,
{
    config.validate()?;

    let registry = Arc::new(MetricsRegistry::new(
        &config.service_name,
        &config.metrics_endpoint,
    )?);
    registry.make_global()?;
    let router = instrument(router, &registry);

    tracing::info!(
        namespace = %registry.namespace(),
        metrics_url = %registry.metrics_url(),
        "metrics endpoint and request hook installed"
    );

    Ok((router, registry))
}
