//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::handlers::health_handler::{HealthResponse, ServiceHealth};
use crate::handlers::propagation_handler::RoundTripReport;

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health_handler::health_check,
        crate::handlers::propagation_handler::inject_extract,
        crate::handlers::propagation_handler::inject_extract_report,
    ),
    components(
        schemas(
            HealthResponse,
            ServiceHealth,
            RoundTripReport,
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Propagation", description = "Trace context inject/extract round trips"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        assert!(paths.contains(&"/health"));
        assert!(paths.contains(&"/api/inject-extract"));
        assert!(paths.contains(&"/api/inject-extract/report"));
    }
}
