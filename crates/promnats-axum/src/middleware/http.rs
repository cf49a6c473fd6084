//! HTTP request instrumentation
//!
//! [`instrument_request`] is the framework-agnostic request hook;
//! [`http_metrics_middleware`] adapts it to axum.

use crate::metrics::collectors::HttpMetricsCollector;
use axum::{
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// `path` label for requests no route matched.
pub const UNMATCHED_PATH: &str = "unmatched";

/// Anything the request hook can read a status code from.
pub trait ResponseStatus {
    fn status_code(&self) -> u16;
}

impl ResponseStatus for Response {
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }
}

impl ResponseStatus for StatusCode {
    fn status_code(&self) -> u16 {
        self.as_u16()
    }
}

impl ResponseStatus for u16 {
    fn status_code(&self) -> u16 {
        *self
    }
}

/// Keeps the in-flight gauge balanced, including when the handler future
/// is dropped or unwinds.
struct InFlightGuard<'a> {
    collector: &'a dyn HttpMetricsCollector,
    method: &'a str,
    path: &'a str,
}

impl<'a> InFlightGuard<'a> {
    fn enter(collector: &'a dyn HttpMetricsCollector, method: &'a str, path: &'a str) -> Self {
        collector.inc_requests_in_progress(method, path);
        Self {
            collector,
            method,
            path,
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.collector
            .dec_requests_in_progress(self.method, self.path);
    }
}

/// Run `next` as one instrumented request.
///
/// Requests for the scrape path are passed through untouched. Otherwise the
/// request is tracked as in flight while `next` runs, and on success one
/// request count and one duration sample are recorded under the response
/// status code. If `next` fails, the error is returned unchanged and no
/// count or duration is recorded.
pub async fn instrument_request<F, T, E>(
    collector: &dyn HttpMetricsCollector,
    method: &str,
    path: &str,
    next: F,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    T: ResponseStatus,
{
    if path == collector.metrics_url() {
        return next.await;
    }

    let start = Instant::now();
    let _in_flight = InFlightGuard::enter(collector, method, path);

    match next.await {
        Ok(response) => {
            let status_code = response.status_code().to_string();
            collector.inc_request_count(&status_code, method, path);
            collector.observe_response_time(
                &status_code,
                method,
                path,
                start.elapsed().as_secs_f64(),
            );
            Ok(response)
        }
        Err(e) => {
            tracing::debug!(method, path, "request handler failed, not counted");
            Err(e)
        }
    }
}

/// Axum middleware recording HTTP metrics for every routed request.
///
/// The `path` label is the matched route template (e.g. `/orders/:id`).
/// Requests that reach the fallback share the [`UNMATCHED_PATH`] label so
/// arbitrary request paths never become series.
///
/// ```ignore
/// use axum::{middleware, Router};
///
/// let collector: Arc<dyn HttpMetricsCollector> = registry.http().clone();
/// let app = Router::new()
///     .route("/", get(handler))
///     .layer(middleware::from_fn_with_state(collector, http_metrics_middleware));
/// ```
pub async fn http_metrics_middleware(
    State(collector): State<Arc<dyn HttpMetricsCollector>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().as_str().to_owned();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str())
        .unwrap_or(UNMATCHED_PATH)
        .to_owned();

    let result: Result<Response, Infallible> =
        instrument_request(collector.as_ref(), &method, &path, async move {
            Ok(next.run(request).await)
        })
        .await;

    match result {
        Ok(response) => response,
        Err(never) => match never {},
    }
}
