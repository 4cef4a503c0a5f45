//! Domain-level errors.
//!
//! These errors describe malformed trace identifiers and propagation values.
//! They are independent of infrastructure concerns (HTTP, exporters).

use thiserror::Error;

/// Domain-specific errors for invalid trace data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Trace id is not 32 lowercase hex chars or is all zero
    #[error("Invalid trace id: {0}")]
    InvalidTraceId(String),

    /// Span id is not 16 lowercase hex chars or is all zero
    #[error("Invalid span id: {0}")]
    InvalidSpanId(String),

    /// Malformed traceparent header
    #[error("Invalid traceparent: {0}")]
    InvalidTraceParent(String),

    /// Malformed tracestate header or entry
    #[error("Invalid tracestate: {0}")]
    InvalidTraceState(String),

    /// Malformed baggage header or entry
    #[error("Invalid baggage: {0}")]
    InvalidBaggage(String),
}

impl DomainError {
    /// Create a traceparent error
    pub fn invalid_traceparent(msg: impl Into<String>) -> Self {
        DomainError::InvalidTraceParent(msg.into())
    }

    /// Create a tracestate error
    pub fn invalid_tracestate(msg: impl Into<String>) -> Self {
        DomainError::InvalidTraceState(msg.into())
    }

    /// Create a baggage error
    pub fn invalid_baggage(msg: impl Into<String>) -> Self {
        DomainError::InvalidBaggage(msg.into())
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
