//! Domain layer - trace identity and propagation value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! All types here are shared by the telemetry SDK and the HTTP service.

pub mod baggage;
pub mod constants;
pub mod error;
pub mod hex;
pub mod ids;
pub mod span;
pub mod span_context;

pub use baggage::{Baggage, BaggageEntry};
pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use ids::{SpanId, TraceId};
pub use span::{AttributeValue, KeyValue, SpanData, SpanEvent, SpanKind, Status};
pub use span_context::{SpanContext, TraceFlags, TraceState};
