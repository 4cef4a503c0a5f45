//! Trace context middleware.

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use domain::{KeyValue, SpanKind, Status};
use telemetry::Context;

use crate::carriers::{HeaderExtractor, HeaderInjector};
use crate::state::AppState;

/// Context of the server span for the current request.
#[derive(Debug, Clone)]
pub struct RequestContext(pub Context);

/// Continue the caller's trace for the duration of the request.
///
/// The caller's context is read from the request headers and a server span
/// is started under it. Handlers receive the resulting context as a
/// [`RequestContext`] extension, and the span's context is written to the
/// response headers.
pub async fn trace_context_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let remote_cx = state
        .telemetry
        .propagator()
        .extract(&HeaderExtractor::new(request.headers()));

    let method = request.method().to_string();
    let target = request.uri().path().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| target.clone());

    let mut span = state
        .http_tracer
        .span_builder(format!("{} {}", method, route))
        .with_kind(SpanKind::Server)
        .with_parent(&remote_cx)
        .with_attribute("http.request.method", method)
        .with_attribute("url.path", target)
        .with_attribute("http.route", route)
        .start();

    let cx = remote_cx.with_span(&span);
    request.extensions_mut().insert(RequestContext(cx.clone()));

    let mut response = next.run(request).await;

    let status = response.status();
    span.set_attribute(KeyValue::new(
        "http.response.status_code",
        i64::from(status.as_u16()),
    ));
    if status.is_server_error() {
        span.set_status(Status::error(status.to_string()));
    }

    state
        .telemetry
        .propagator()
        .inject_context(&cx, &mut HeaderInjector(response.headers_mut()));
    span.end();

    response
}
