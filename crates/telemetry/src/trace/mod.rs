//! Tracing API: provider, tracers and spans.

mod provider;
mod span;
mod tracer;

pub use provider::{TracerProvider, TracerProviderBuilder};
pub use span::Span;
pub use tracer::{SpanBuilder, Tracer};
