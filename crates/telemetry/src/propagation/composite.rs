//! Propagator that runs several propagators in sequence.

use super::{Extractor, Injector, TextMapPropagator};
use crate::context::Context;

/// Runs each propagator in order on inject and extract.
///
/// An empty composite injects and extracts nothing.
#[derive(Debug, Default)]
pub struct TextMapCompositePropagator {
    propagators: Vec<Box<dyn TextMapPropagator>>,
}

impl TextMapCompositePropagator {
    pub fn new(propagators: Vec<Box<dyn TextMapPropagator>>) -> Self {
        Self { propagators }
    }

    pub fn is_empty(&self) -> bool {
        self.propagators.is_empty()
    }
}

impl TextMapPropagator for TextMapCompositePropagator {
    fn inject_context(&self, cx: &Context, injector: &mut dyn Injector) {
        for propagator in &self.propagators {
            propagator.inject_context(cx, injector);
        }
    }

    fn extract_with_context(&self, cx: &Context, extractor: &dyn Extractor) -> Context {
        self.propagators
            .iter()
            .fold(cx.clone(), |cx, propagator| propagator.extract_with_context(&cx, extractor))
    }

    fn fields(&self) -> Vec<&'static str> {
        self.propagators
            .iter()
            .flat_map(|propagator| propagator.fields())
            .collect()
    }
}
