//! Live spans.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::{KeyValue, SpanContext, SpanData, SpanEvent, SpanId, SpanKind, Status};

use super::provider::ProviderInner;

/// Mutable state of a recording span.
pub(crate) struct SpanRecord {
    pub(crate) name: String,
    pub(crate) kind: SpanKind,
    pub(crate) parent_span_id: SpanId,
    pub(crate) start_time: DateTime<Utc>,
    pub(crate) attributes: Vec<KeyValue>,
    pub(crate) events: Vec<SpanEvent>,
    pub(crate) status: Status,
}

/// A unit of work in a trace.
///
/// Sampled-out spans still carry a valid context, so they propagate, but
/// record nothing. Ending is idempotent; a span dropped without `end` is
/// ended at drop time.
pub struct Span {
    span_context: SpanContext,
    record: Option<SpanRecord>,
    provider: Arc<ProviderInner>,
    instrumentation_scope: String,
}

impl Span {
    pub(crate) fn new(
        span_context: SpanContext,
        record: Option<SpanRecord>,
        provider: Arc<ProviderInner>,
        instrumentation_scope: String,
    ) -> Self {
        Self {
            span_context,
            record,
            provider,
            instrumentation_scope,
        }
    }

    pub fn span_context(&self) -> &SpanContext {
        &self.span_context
    }

    /// Whether attributes and events are kept. False once ended.
    pub fn is_recording(&self) -> bool {
        self.record.is_some()
    }

    pub fn add_event(&mut self, name: impl Into<String>) {
        self.add_event_with_attributes(name, Vec::new());
    }

    pub fn add_event_with_attributes(&mut self, name: impl Into<String>, attributes: Vec<KeyValue>) {
        if let Some(record) = self.record.as_mut() {
            record.events.push(SpanEvent {
                name: name.into(),
                timestamp: Utc::now(),
                attributes,
            });
        }
    }

    /// Set an attribute, replacing any previous value for the key.
    pub fn set_attribute(&mut self, attribute: KeyValue) {
        if let Some(record) = self.record.as_mut() {
            match record.attributes.iter_mut().find(|kv| kv.key == attribute.key) {
                Some(existing) => existing.value = attribute.value,
                None => record.attributes.push(attribute),
            }
        }
    }

    /// `Ok` is final; `Error` replaces `Unset` or an earlier error.
    pub fn set_status(&mut self, status: Status) {
        if let Some(record) = self.record.as_mut() {
            let keep_current = matches!(record.status, Status::Ok) || matches!(status, Status::Unset);
            if !keep_current {
                record.status = status;
            }
        }
    }

    pub fn update_name(&mut self, name: impl Into<String>) {
        if let Some(record) = self.record.as_mut() {
            record.name = name.into();
        }
    }

    pub fn end(&mut self) {
        self.end_with_timestamp(Utc::now());
    }

    pub fn end_with_timestamp(&mut self, end_time: DateTime<Utc>) {
        let Some(record) = self.record.take() else {
            return;
        };

        let data = SpanData {
            span_context: self.span_context.clone(),
            parent_span_id: record.parent_span_id,
            name: record.name,
            kind: record.kind,
            start_time: record.start_time,
            end_time: end_time.max(record.start_time),
            attributes: record.attributes,
            events: record.events,
            status: record.status,
            instrumentation_scope: self.instrumentation_scope.clone(),
        };

        if let Some((last, rest)) = self.provider.processors.split_last() {
            for processor in rest {
                processor.on_end(data.clone());
            }
            last.on_end(data);
        }
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        self.end();
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Span")
            .field("span_context", &self.span_context)
            .field("is_recording", &self.is_recording())
            .field("instrumentation_scope", &self.instrumentation_scope)
            .finish()
    }
}
