//! Process-wide telemetry registry.
//!
//! The binary installs its pipeline once at startup; library code that has
//! no handle of its own can reach it through [`global`]. Until something is
//! installed, a disabled pipeline is returned.

use once_cell::sync::{Lazy, OnceCell};

use crate::error::{TelemetryError, TelemetryResult};
use crate::sdk::Telemetry;
use crate::trace::Tracer;

static GLOBAL: OnceCell<Telemetry> = OnceCell::new();
static DISABLED: Lazy<Telemetry> = Lazy::new(Telemetry::disabled);

/// Install the process-wide pipeline. Only the first call succeeds.
pub fn set_global(telemetry: Telemetry) -> TelemetryResult<()> {
    GLOBAL
        .set(telemetry)
        .map_err(|_| TelemetryError::GlobalAlreadySet)
}

pub fn global() -> &'static Telemetry {
    GLOBAL.get().unwrap_or_else(|| Lazy::force(&DISABLED))
}

/// Tracer from the process-wide pipeline.
pub fn tracer(name: impl Into<String>) -> Tracer {
    global().tracer(name)
}
