//! Telemetry pipeline errors.

use common::AppError;
use thiserror::Error;

/// Errors raised while building or running the tracing pipeline.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid telemetry configuration: {0}")]
    Config(String),

    #[error("Span export failed: {0}")]
    Export(String),

    #[error("Span processor worker is gone")]
    ChannelClosed,

    #[error("Already shut down")]
    AlreadyShutdown,

    #[error("Global telemetry is already installed")]
    GlobalAlreadySet,
}

impl TelemetryError {
    pub fn config(msg: impl Into<String>) -> Self {
        TelemetryError::Config(msg.into())
    }

    pub fn export(msg: impl Into<String>) -> Self {
        TelemetryError::Export(msg.into())
    }
}

/// Result type alias
pub type TelemetryResult<T> = Result<T, TelemetryError>;

impl From<TelemetryError> for AppError {
    fn from(err: TelemetryError) -> Self {
        match err {
            TelemetryError::Config(msg) => AppError::Config(msg),
            other => AppError::Telemetry(other.to_string()),
        }
    }
}
