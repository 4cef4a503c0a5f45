//! W3C Baggage propagator.

use domain::{Baggage, BAGGAGE_HEADER};
use tracing::debug;

use super::{Extractor, Injector, TextMapPropagator};
use crate::context::Context;

/// Propagates context baggage in the `baggage` header.
#[derive(Clone, Copy, Debug, Default)]
pub struct BaggagePropagator;

impl BaggagePropagator {
    pub fn new() -> Self {
        Self
    }
}

impl TextMapPropagator for BaggagePropagator {
    fn inject_context(&self, cx: &Context, injector: &mut dyn Injector) {
        let (header, omitted) = cx.baggage().encode();
        if omitted > 0 {
            debug!(omitted, "Baggage entries left out of oversized header");
        }
        if !header.is_empty() {
            injector.set(BAGGAGE_HEADER, header);
        }
    }

    fn extract_with_context(&self, cx: &Context, extractor: &dyn Extractor) -> Context {
        let Some(header) = extractor.get(BAGGAGE_HEADER) else {
            return cx.clone();
        };

        match Baggage::parse(header) {
            Ok(baggage) if !baggage.is_empty() => cx.with_baggage(baggage),
            Ok(_) => cx.clone(),
            Err(e) => {
                debug!(error = %e, "Ignoring malformed baggage header");
                cx.clone()
            }
        }
    }

    fn fields(&self) -> Vec<&'static str> {
        vec![BAGGAGE_HEADER]
    }
}
