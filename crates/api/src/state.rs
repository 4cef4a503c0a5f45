//! Application state for dependency injection.

use std::sync::Arc;

use telemetry::{Telemetry, Tracer};

use crate::config::ApiConfig;
use crate::service::{ContextRoundTrip, PropagationService};

/// Instrumentation scope of the server spans.
pub const HTTP_TRACER_NAME: &str = "ctxprop.http";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub telemetry: Telemetry,
    pub http_tracer: Tracer,
    pub propagation: Arc<dyn PropagationService>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// Create new app state.
    pub fn new(telemetry: Telemetry, config: ApiConfig) -> Self {
        Self {
            http_tracer: telemetry.tracer(HTTP_TRACER_NAME),
            propagation: Arc::new(ContextRoundTrip::new(telemetry.clone())),
            telemetry,
            config: Arc::new(config),
        }
    }
}
