//! Propagation service - Carries a span context through a text map and back.

use std::collections::HashMap;

use domain::{
    SpanContext, CHILD_SPAN_EVENT, CHILD_SPAN_NAME, DEFAULT_TRACER_NAME, PARENT_SPAN_NAME,
};
use telemetry::{Context, Telemetry, Tracer};
use tracing::debug;

/// Outcome of one inject/extract round trip.
#[derive(Debug, Clone)]
pub struct RoundTrip {
    /// Context of the span the carrier was injected from
    pub parent: SpanContext,
    /// Context of the span started from the extracted context
    pub child: SpanContext,
    /// Fields written by the propagator
    pub carrier: HashMap<String, String>,
    /// Context read back from the carrier
    pub extracted: Context,
}

impl RoundTrip {
    /// Whether the child continued the parent through the carrier.
    pub fn context_propagated(&self) -> bool {
        self.child.trace_id() == self.parent.trace_id()
            && self.extracted.span_context().map(SpanContext::span_id) == Some(self.parent.span_id())
    }
}

/// Propagation service trait for dependency injection.
pub trait PropagationService: Send + Sync {
    /// Start a parent span under `cx`, inject it into a text map, extract it
    /// back and start a child span from the result. Both spans are ended
    /// before returning.
    fn inject_extract(&self, cx: &Context) -> RoundTrip;
}

/// Round trip through an in-memory carrier using the configured propagator.
pub struct ContextRoundTrip {
    telemetry: Telemetry,
    tracer: Tracer,
}

impl ContextRoundTrip {
    pub fn new(telemetry: Telemetry) -> Self {
        Self {
            tracer: telemetry.tracer(DEFAULT_TRACER_NAME),
            telemetry,
        }
    }

    fn start_child_from_carrier(
        &self,
        base: &Context,
        carrier: &HashMap<String, String>,
    ) -> (SpanContext, Context) {
        let extracted = self.telemetry.propagator().extract_with_context(base, carrier);

        let mut child = self.tracer.start_with_context(CHILD_SPAN_NAME, &extracted);
        child.add_event(CHILD_SPAN_EVENT);
        let child_context = child.span_context().clone();
        child.end();

        (child_context, extracted)
    }
}

impl PropagationService for ContextRoundTrip {
    fn inject_extract(&self, cx: &Context) -> RoundTrip {
        // Ends on drop if anything below unwinds
        let mut parent = self.tracer.start_with_context(PARENT_SPAN_NAME, cx);
        let parent_cx = cx.with_span(&parent);

        let mut carrier: HashMap<String, String> = HashMap::new();
        self.telemetry.propagator().inject_context(&parent_cx, &mut carrier);
        debug!(?carrier, "Injected parent context");

        let (child, extracted) = self.start_child_from_carrier(cx, &carrier);
        let parent_context = parent.span_context().clone();
        parent.end();

        debug!(
            trace_id = %parent_context.trace_id(),
            parent_span_id = %parent_context.span_id(),
            child_span_id = %child.span_id(),
            "Parent and child spans ended"
        );

        RoundTrip {
            parent: parent_context,
            child,
            carrier,
            extracted,
        }
    }
}
