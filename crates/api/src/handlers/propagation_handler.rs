//! Context propagation handlers.

use std::collections::BTreeMap;

use axum::{
    extract::{Extension, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use common::AppResult;
use domain::{Baggage, INJECT_EXTRACT_MESSAGE};
use telemetry::Context;

use crate::middleware::RequestContext;
use crate::service::RoundTrip;
use crate::state::AppState;

/// Report query parameters
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// Baggage in W3C header syntax to attach to the parent span's context
    #[param(example = "tenant=acme,region=eu")]
    pub baggage: Option<String>,
}

/// What the inject/extract round trip produced
#[derive(Debug, Serialize, ToSchema)]
pub struct RoundTripReport {
    #[schema(example = "Parent and child spans created and logged.")]
    pub message: String,
    /// Trace of the parent span
    #[schema(example = "4bf92f3577b34da6a3ce929d0e0e4736")]
    pub trace_id: String,
    #[schema(example = "00f067aa0ba902b7")]
    pub parent_span_id: String,
    /// Trace of the child span; equals `trace_id` when propagation worked
    pub child_trace_id: String,
    pub child_span_id: String,
    /// Fields the propagator wrote into the carrier
    pub carrier: BTreeMap<String, String>,
    /// Baggage read back from the carrier
    pub baggage: BTreeMap<String, String>,
    /// Whether the child span continued the parent's trace
    pub context_propagated: bool,
}

impl From<RoundTrip> for RoundTripReport {
    fn from(round_trip: RoundTrip) -> Self {
        Self {
            message: INJECT_EXTRACT_MESSAGE.to_string(),
            trace_id: round_trip.parent.trace_id().to_string(),
            parent_span_id: round_trip.parent.span_id().to_string(),
            child_trace_id: round_trip.child.trace_id().to_string(),
            child_span_id: round_trip.child.span_id().to_string(),
            context_propagated: round_trip.context_propagated(),
            baggage: round_trip
                .extracted
                .baggage()
                .iter()
                .map(|(key, entry)| (key.to_string(), entry.value().to_string()))
                .collect(),
            carrier: round_trip.carrier.into_iter().collect(),
        }
    }
}

/// Create propagation routes
pub fn propagation_routes() -> Router<AppState> {
    Router::new()
        .route("/inject-extract", get(inject_extract))
        .route("/inject-extract/report", get(inject_extract_report))
}

/// Create a parent span, carry its context through a map and start a child span from it
#[utoipa::path(
    get,
    path = "/api/inject-extract",
    tag = "Propagation",
    responses(
        (status = 200, description = "Spans created", body = String, content_type = "text/plain")
    )
)]
pub async fn inject_extract(
    State(state): State<AppState>,
    Extension(RequestContext(cx)): Extension<RequestContext>,
) -> &'static str {
    state.propagation.inject_extract(&cx);
    INJECT_EXTRACT_MESSAGE
}

/// Same round trip as `/api/inject-extract`, reporting what was propagated
#[utoipa::path(
    get,
    path = "/api/inject-extract/report",
    tag = "Propagation",
    params(ReportQuery),
    responses(
        (status = 200, description = "Round trip report", body = RoundTripReport),
        (status = 400, description = "Malformed baggage")
    )
)]
pub async fn inject_extract_report(
    State(state): State<AppState>,
    Extension(RequestContext(cx)): Extension<RequestContext>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<RoundTripReport>> {
    let cx = with_query_baggage(cx, query.baggage.as_deref())?;
    let round_trip = state.propagation.inject_extract(&cx);

    Ok(Json(RoundTripReport::from(round_trip)))
}

/// Merge baggage from the query over the baggage the caller propagated.
fn with_query_baggage(cx: Context, raw: Option<&str>) -> AppResult<Context> {
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        return Ok(cx);
    };

    let mut baggage = cx.baggage().clone();
    for (key, entry) in Baggage::parse(raw)?.iter() {
        baggage.insert_with_metadata(key, entry.value(), entry.metadata())?;
    }

    Ok(cx.with_baggage(baggage))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_baggage_overrides_propagated_entries() {
        let mut propagated = Baggage::new();
        propagated.insert("tenant", "old").unwrap();
        propagated.insert("user", "7").unwrap();
        let cx = Context::new().with_baggage(propagated);

        let cx = with_query_baggage(cx, Some("tenant=new;ttl=5")).unwrap();
        assert_eq!(cx.baggage().get("tenant"), Some("new"));
        assert_eq!(cx.baggage().entry("tenant").unwrap().metadata(), "ttl=5");
        assert_eq!(cx.baggage().get("user"), Some("7"));
    }

    #[test]
    fn test_blank_query_baggage_is_ignored() {
        let cx = with_query_baggage(Context::new(), Some("  ")).unwrap();
        assert!(cx.baggage().is_empty());
        assert!(with_query_baggage(Context::new(), None).is_ok());
    }

    #[test]
    fn test_malformed_query_baggage_is_validation_error() {
        let err = with_query_baggage(Context::new(), Some("no-equals-sign")).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
