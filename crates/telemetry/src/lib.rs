//! Telemetry library.
//!
//! This crate provides:
//! - An explicit-context tracing API (provider, tracers, spans)
//! - W3C Trace Context and Baggage text map propagators
//! - Head sampling, span processors and exporters
//! - Configuration-driven wiring and a process-wide registry
//!
//! Header formats follow the W3C recommendations:
//! - Trace Context (<https://www.w3.org/TR/trace-context/>): `traceparent`
//!   parsing and versioning, `tracestate` list rules, see
//!   [`propagation::TraceContextPropagator`]
//! - Baggage (<https://www.w3.org/TR/baggage/>): member syntax, percent
//!   encoding and size limits, see [`domain::Baggage`] and
//!   [`propagation::BaggagePropagator`]
//!
//! Sampler names and `OTEL_*` settings follow the OpenTelemetry SDK
//! environment variable conventions.

pub mod context;
pub mod error;
pub mod export;
pub mod global;
pub mod id_generator;
pub mod processor;
pub mod propagation;
pub mod sampler;
pub mod sdk;
pub mod trace;

pub use context::Context;
pub use error::{TelemetryError, TelemetryResult};
pub use export::{InMemorySpanExporter, LoggingSpanExporter, SpanExporter};
pub use id_generator::{IdGenerator, RandomIdGenerator};
pub use processor::{BatchSpanProcessor, SimpleSpanProcessor, SpanProcessor};
pub use propagation::{
    BaggagePropagator, Extractor, Injector, TextMapCompositePropagator, TextMapPropagator,
    TraceContextPropagator,
};
pub use sampler::{Sampler, SamplingDecision};
pub use sdk::Telemetry;
pub use trace::{Span, SpanBuilder, Tracer, TracerProvider, TracerProviderBuilder};
