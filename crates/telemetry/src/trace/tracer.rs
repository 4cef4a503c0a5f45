//! Tracer and span builder.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use domain::{AttributeValue, KeyValue, SpanContext, SpanId, SpanKind, TraceFlags};

use super::provider::ProviderInner;
use super::span::{Span, SpanRecord};
use crate::context::Context;
use crate::sampler::SamplingDecision;

/// Starts spans for one instrumentation scope.
#[derive(Clone)]
pub struct Tracer {
    name: Arc<str>,
    provider: Arc<ProviderInner>,
}

impl Tracer {
    pub(crate) fn new(name: String, provider: Arc<ProviderInner>) -> Self {
        Self {
            name: name.into(),
            provider,
        }
    }

    /// Instrumentation scope name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span_builder(&self, name: impl Into<String>) -> SpanBuilder<'_> {
        SpanBuilder {
            tracer: self,
            name: name.into(),
            kind: SpanKind::Internal,
            parent: None,
            attributes: Vec::new(),
        }
    }

    /// Start a root span.
    pub fn start(&self, name: impl Into<String>) -> Span {
        self.span_builder(name).start()
    }

    /// Start a span whose parent is the active span of `parent`, if any.
    pub fn start_with_context(&self, name: impl Into<String>, parent: &Context) -> Span {
        self.span_builder(name).with_parent(parent).start()
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer").field("name", &self.name).finish()
    }
}

/// Collects span options before the span starts.
pub struct SpanBuilder<'a> {
    tracer: &'a Tracer,
    name: String,
    kind: SpanKind,
    parent: Option<SpanContext>,
    attributes: Vec<KeyValue>,
}

impl SpanBuilder<'_> {
    pub fn with_kind(mut self, kind: SpanKind) -> Self {
        self.kind = kind;
        self
    }

    /// Use the active span of `cx` as parent. A context without an active
    /// span makes the new span a root.
    pub fn with_parent(mut self, cx: &Context) -> Self {
        self.parent = cx.span_context().cloned();
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.push(KeyValue::new(key, value));
        self
    }

    pub fn start(self) -> Span {
        let provider = &self.tracer.provider;
        let parent = self.parent.filter(SpanContext::is_valid);

        let trace_id = parent
            .as_ref()
            .map(SpanContext::trace_id)
            .unwrap_or_else(|| provider.id_generator.new_trace_id());
        let span_id = provider.id_generator.new_span_id();
        let parent_span_id = parent
            .as_ref()
            .map(SpanContext::span_id)
            .unwrap_or(SpanId::INVALID);

        let decision = if provider.is_shutdown() {
            SamplingDecision::Drop
        } else {
            provider.sampler.should_sample(parent.as_ref(), trace_id)
        };
        let sampled = decision == SamplingDecision::RecordAndSample;

        let (trace_flags, trace_state) = match parent {
            Some(parent) => (parent.trace_flags(), parent.trace_state().clone()),
            None => (TraceFlags::DEFAULT, Default::default()),
        };
        let span_context = SpanContext::new(
            trace_id,
            span_id,
            trace_flags.with_sampled(sampled),
            false,
            trace_state,
        );

        let record = sampled.then(|| SpanRecord {
            name: self.name,
            kind: self.kind,
            parent_span_id,
            start_time: Utc::now(),
            attributes: self.attributes,
            events: Vec::new(),
            status: Default::default(),
        });

        Span::new(
            span_context,
            record,
            self.tracer.provider.clone(),
            self.tracer.name.to_string(),
        )
    }
}
