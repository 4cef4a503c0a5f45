//! W3C Trace Context propagator (`traceparent` / `tracestate`).

use domain::{
    hex, DomainError, DomainResult, SpanContext, SpanId, TraceFlags, TraceId, TraceState,
    INVALID_TRACEPARENT_VERSION, SUPPORTED_TRACEPARENT_VERSION, TRACEPARENT_HEADER,
    TRACESTATE_HEADER,
};
use tracing::debug;

use super::{Extractor, Injector, TextMapPropagator};
use crate::context::Context;

/// Propagates the active span context in W3C Trace Context format.
#[derive(Clone, Copy, Debug, Default)]
pub struct TraceContextPropagator;

impl TraceContextPropagator {
    pub fn new() -> Self {
        Self
    }

    fn extract_span_context(&self, extractor: &dyn Extractor) -> DomainResult<SpanContext> {
        let header = extractor
            .get(TRACEPARENT_HEADER)
            .ok_or_else(|| DomainError::invalid_traceparent("header missing"))?;
        let parts: Vec<&str> = header.trim().split('-').collect();
        if parts.len() < 4 {
            return Err(DomainError::invalid_traceparent(format!("too few fields in {:?}", header)));
        }

        let [version] = hex::decode::<1>(parts[0])
            .ok_or_else(|| DomainError::invalid_traceparent(format!("bad version {:?}", parts[0])))?;
        if version == INVALID_TRACEPARENT_VERSION {
            return Err(DomainError::invalid_traceparent("version ff is forbidden"));
        }
        // Later versions may append fields; version 00 may not
        if version == SUPPORTED_TRACEPARENT_VERSION && parts.len() != 4 {
            return Err(DomainError::invalid_traceparent(format!("too many fields in {:?}", header)));
        }

        let trace_id = TraceId::from_hex(parts[1])?;
        let span_id = SpanId::from_hex(parts[2])?;
        let [flags] = hex::decode::<1>(parts[3])
            .ok_or_else(|| DomainError::invalid_traceparent(format!("bad flags {:?}", parts[3])))?;

        let trace_state = match extractor.get(TRACESTATE_HEADER) {
            Some(raw) => TraceState::parse(raw).unwrap_or_else(|e| {
                debug!(error = %e, "Dropping invalid tracestate");
                TraceState::default()
            }),
            None => TraceState::default(),
        };

        Ok(SpanContext::new(
            trace_id,
            span_id,
            TraceFlags::new(flags),
            true,
            trace_state,
        ))
    }
}

impl TextMapPropagator for TraceContextPropagator {
    fn inject_context(&self, cx: &Context, injector: &mut dyn Injector) {
        let Some(span_context) = cx.span_context() else {
            return;
        };

        injector.set(
            TRACEPARENT_HEADER,
            format!(
                "{:02x}-{}-{}-{}",
                SUPPORTED_TRACEPARENT_VERSION,
                span_context.trace_id(),
                span_context.span_id(),
                span_context.trace_flags()
            ),
        );

        if !span_context.trace_state().is_empty() {
            injector.set(TRACESTATE_HEADER, span_context.trace_state().header());
        }
    }

    fn extract_with_context(&self, cx: &Context, extractor: &dyn Extractor) -> Context {
        match self.extract_span_context(extractor) {
            Ok(span_context) => cx.with_span_context(span_context),
            Err(e) => {
                debug!(error = %e, "No trace context extracted");
                cx.clone()
            }
        }
    }

    fn fields(&self) -> Vec<&'static str> {
        vec![TRACEPARENT_HEADER, TRACESTATE_HEADER]
    }
}
