//! Propagation context.
//!
//! A [`Context`] is an immutable value. There is no ambient "current"
//! context: callers pass the context they want a span or a propagator to
//! use, and derive new contexts with the `with_*` methods.

use domain::{Baggage, SpanContext};

use crate::trace::Span;

/// Values that travel together across API and process boundaries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Context {
    span_context: Option<SpanContext>,
    baggage: Baggage,
}

impl Context {
    /// The root context: no span, no baggage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this context with `span` as the active span.
    pub fn with_span(&self, span: &Span) -> Self {
        self.with_span_context(span.span_context().clone())
    }

    /// Copy of this context with the given span context.
    ///
    /// An invalid span context clears the active span.
    pub fn with_span_context(&self, span_context: SpanContext) -> Self {
        Self {
            span_context: span_context.is_valid().then_some(span_context),
            baggage: self.baggage.clone(),
        }
    }

    pub fn with_baggage(&self, baggage: Baggage) -> Self {
        Self {
            span_context: self.span_context.clone(),
            baggage,
        }
    }

    /// The active span context, if any.
    pub fn span_context(&self) -> Option<&SpanContext> {
        self.span_context.as_ref()
    }

    pub fn has_active_span(&self) -> bool {
        self.span_context.is_some()
    }

    pub fn baggage(&self) -> &Baggage {
        &self.baggage
    }
}
