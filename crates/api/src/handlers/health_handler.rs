//! Health check handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    #[schema(example = "otel-ctx-prop")]
    pub service: String,
    /// Headers read and written by the configured propagators
    pub propagation_fields: Vec<String>,
    pub telemetry: ServiceHealth,
}

/// Telemetry pipeline status with optional error message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Create health routes.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

/// Health check endpoint - reports whether spans are still being recorded.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Telemetry pipeline is shut down", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Response {
    let telemetry_health = if state.telemetry.provider().is_shutdown() {
        ServiceHealth {
            status: "unhealthy".to_string(),
            error: Some("tracer provider is shut down".to_string()),
        }
    } else {
        ServiceHealth {
            status: "healthy".to_string(),
            error: None,
        }
    };

    let all_healthy = telemetry_health.error.is_none();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        service: state.config.service.service_name.clone(),
        propagation_fields: state
            .telemetry
            .propagator()
            .fields()
            .into_iter()
            .map(String::from)
            .collect(),
        telemetry: telemetry_health,
    };

    if all_healthy {
        (StatusCode::OK, Json(response)).into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response)).into_response()
    }
}
