//! Router-level tests: requests go through the trace context middleware and
//! spans land in an in-memory exporter.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    routing::get,
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use api_lib::config::ApiConfig;
use api_lib::middleware::trace_context_middleware;
use api_lib::routes::create_router;
use api_lib::state::AppState;
use domain::{
    AttributeValue, SpanData, SpanId, SpanKind, Status, TraceId, CHILD_SPAN_EVENT, CHILD_SPAN_NAME,
    INJECT_EXTRACT_MESSAGE, PARENT_SPAN_NAME,
};
use telemetry::{
    BaggagePropagator, InMemorySpanExporter, Sampler, Telemetry, TextMapCompositePropagator,
    TraceContextPropagator, TracerProvider,
};

const REMOTE_TRACEPARENT: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

fn w3c_propagator() -> TextMapCompositePropagator {
    TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ])
}

fn test_state(propagator: TextMapCompositePropagator) -> (AppState, InMemorySpanExporter) {
    let exporter = InMemorySpanExporter::new();
    let provider = TracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .with_sampler(Sampler::default())
        .build();
    let state = AppState::new(Telemetry::new(provider, propagator), ApiConfig::default());
    (state, exporter)
}

fn test_app(propagator: TextMapCompositePropagator) -> (Router, InMemorySpanExporter) {
    let (state, exporter) = test_state(propagator);
    (create_router(state), exporter)
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

fn span<'a>(spans: &'a [SpanData], name: &str) -> &'a SpanData {
    spans
        .iter()
        .find(|span| span.name == name)
        .unwrap_or_else(|| panic!("no span named {name}"))
}

#[tokio::test]
async fn test_inject_extract_returns_message() {
    let (app, _exporter) = test_app(w3c_propagator());

    let response = app.oneshot(get_request("/api/inject-extract")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, INJECT_EXTRACT_MESSAGE);
}

#[tokio::test]
async fn test_inject_extract_links_spans() {
    let (app, exporter) = test_app(w3c_propagator());

    app.oneshot(get_request("/api/inject-extract")).await.unwrap();

    let spans = exporter.finished_spans();
    assert_eq!(spans.len(), 3);
    let server = span(&spans, "GET /api/inject-extract");
    let parent = span(&spans, PARENT_SPAN_NAME);
    let child = span(&spans, CHILD_SPAN_NAME);

    assert_eq!(server.kind, SpanKind::Server);
    assert!(server.is_root());

    let trace_id = server.span_context.trace_id();
    assert_eq!(parent.span_context.trace_id(), trace_id);
    assert_eq!(child.span_context.trace_id(), trace_id);
    assert_eq!(parent.parent_span_id, server.span_context.span_id());
    assert_eq!(child.parent_span_id, parent.span_context.span_id());

    assert_eq!(child.events.len(), 1);
    assert_eq!(child.events[0].name, CHILD_SPAN_EVENT);
    assert!(child.end_time <= parent.end_time);
}

#[tokio::test]
async fn test_incoming_traceparent_is_continued() {
    let (app, exporter) = test_app(w3c_propagator());

    let request = Request::builder()
        .uri("/api/inject-extract")
        .header("traceparent", REMOTE_TRACEPARENT)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let remote_trace = TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap();
    let spans = exporter.finished_spans();
    assert_eq!(spans.len(), 3);
    assert!(spans
        .iter()
        .all(|span| span.span_context.trace_id() == remote_trace));

    let server = span(&spans, "GET /api/inject-extract");
    assert_eq!(
        server.parent_span_id,
        SpanId::from_hex("00f067aa0ba902b7").unwrap()
    );
}

#[tokio::test]
async fn test_response_carries_server_span_context() {
    let (app, exporter) = test_app(w3c_propagator());

    let request = Request::builder()
        .uri("/api/inject-extract")
        .header("traceparent", REMOTE_TRACEPARENT)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    let server = span(&exporter.finished_spans(), "GET /api/inject-extract").clone();
    let expected = format!(
        "00-{}-{}-01",
        server.span_context.trace_id(),
        server.span_context.span_id()
    );
    assert_eq!(response.headers()["traceparent"], expected.as_str());
}

#[tokio::test]
async fn test_unsampled_caller_records_nothing() {
    let (app, exporter) = test_app(w3c_propagator());

    let request = Request::builder()
        .uri("/api/inject-extract")
        .header(
            "traceparent",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-00",
        )
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let traceparent = response.headers()["traceparent"].to_str().unwrap();
    assert!(traceparent.starts_with("00-4bf92f3577b34da6a3ce929d0e0e4736-"));
    assert!(traceparent.ends_with("-00"));
    assert!(exporter.finished_spans().is_empty());
}

#[tokio::test]
async fn test_report_describes_round_trip() {
    let (app, exporter) = test_app(w3c_propagator());

    let response = app
        .oneshot(get_request("/api/inject-extract/report?baggage=tenant%3Dacme%2Cregion%3Deu"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["message"], INJECT_EXTRACT_MESSAGE);
    assert_eq!(json["context_propagated"], true);
    assert_eq!(json["trace_id"], json["child_trace_id"]);
    assert_eq!(json["baggage"]["tenant"], "acme");
    assert_eq!(json["baggage"]["region"], "eu");
    assert_eq!(json["carrier"]["baggage"], "region=eu,tenant=acme");

    let traceparent = json["carrier"]["traceparent"].as_str().unwrap();
    let trace_id = json["trace_id"].as_str().unwrap();
    let parent_span_id = json["parent_span_id"].as_str().unwrap();
    assert_eq!(traceparent, format!("00-{}-{}-01", trace_id, parent_span_id));

    let spans = exporter.finished_spans();
    let child = span(&spans, CHILD_SPAN_NAME);
    assert_eq!(child.span_context.span_id().to_string(), json["child_span_id"]);
}

#[tokio::test]
async fn test_report_rejects_malformed_baggage() {
    let (app, exporter) = test_app(w3c_propagator());

    let response = app
        .oneshot(get_request("/api/inject-extract/report?baggage=missing-value"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");

    // Only the server span; a client error does not mark it failed
    let spans = exporter.finished_spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].status, Status::Unset);
}

#[tokio::test]
async fn test_without_propagators_child_falls_back_to_request_context() {
    let (app, exporter) = test_app(TextMapCompositePropagator::default());

    let request = Request::builder()
        .uri("/api/inject-extract/report")
        .header("traceparent", REMOTE_TRACEPARENT)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("traceparent").is_none());

    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["context_propagated"], false);
    assert!(json["carrier"].as_object().unwrap().is_empty());

    let spans = exporter.finished_spans();
    let server = span(&spans, "GET /api/inject-extract/report");
    let child = span(&spans, CHILD_SPAN_NAME);
    // The caller's header is ignored too
    assert!(server.is_root());
    assert_eq!(child.parent_span_id, server.span_context.span_id());
}

#[tokio::test]
async fn test_repeated_tracestate_headers_are_combined() {
    let (app, _exporter) = test_app(w3c_propagator());

    let request = Request::builder()
        .uri("/api/inject-extract/report")
        .header("traceparent", REMOTE_TRACEPARENT)
        .header("tracestate", "rojo=00f067aa0ba902b7")
        .header("tracestate", "congo=t61rcWkgMzE")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["tracestate"],
        "rojo=00f067aa0ba902b7,congo=t61rcWkgMzE"
    );

    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(
        json["carrier"]["tracestate"],
        "rojo=00f067aa0ba902b7,congo=t61rcWkgMzE"
    );
}

#[tokio::test]
async fn test_server_error_marks_span_failed() {
    let (state, exporter) = test_state(w3c_propagator());
    let app = Router::new()
        .route("/boom", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            trace_context_middleware,
        ))
        .with_state(state);

    let response = app.oneshot(get_request("/boom")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().contains_key("traceparent"));

    let spans = exporter.finished_spans();
    let server = span(&spans, "GET /boom");
    assert_eq!(server.status, Status::error("500 Internal Server Error"));
    assert_eq!(
        server.attribute("http.response.status_code"),
        Some(&AttributeValue::I64(500))
    );
}

#[tokio::test]
async fn test_health_reports_propagation_fields() {
    let (app, _exporter) = test_app(w3c_propagator());

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "otel-ctx-prop");
    assert_eq!(
        json["propagation_fields"],
        serde_json::json!(["traceparent", "tracestate", "baggage"])
    );
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (app, _exporter) = test_app(w3c_propagator());

    let response = app.oneshot(get_request("/api-docs/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(json["paths"]["/api/inject-extract"].is_object());
}
