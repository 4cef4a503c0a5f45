//! Span exporters.

use std::sync::{Arc, Mutex, PoisonError};

use domain::SpanData;
use tracing::info;

use crate::error::TelemetryResult;

#[cfg(test)]
use mockall::automock;

/// Destination for finished spans.
#[cfg_attr(test, automock)]
pub trait SpanExporter: Send + Sync {
    /// Export one batch of spans.
    fn export(&self, batch: Vec<SpanData>) -> TelemetryResult<()>;

    /// Release exporter resources. Called once by the owning processor.
    fn shutdown(&self) -> TelemetryResult<()> {
        Ok(())
    }
}

/// Writes every finished span as a structured log event.
#[derive(Debug, Clone)]
pub struct LoggingSpanExporter {
    service_name: String,
}

impl LoggingSpanExporter {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

impl SpanExporter for LoggingSpanExporter {
    fn export(&self, batch: Vec<SpanData>) -> TelemetryResult<()> {
        for span in batch {
            let duration_us = span.duration().num_microseconds().unwrap_or(i64::MAX);
            info!(
                target: "telemetry::export",
                service = %self.service_name,
                scope = %span.instrumentation_scope,
                trace_id = %span.span_context.trace_id(),
                span_id = %span.span_context.span_id(),
                parent_span_id = %span.parent_span_id,
                kind = ?span.kind,
                status = ?span.status,
                duration_us,
                "span {}",
                span.name
            );

            for event in &span.events {
                info!(
                    target: "telemetry::export",
                    trace_id = %span.span_context.trace_id(),
                    span_id = %span.span_context.span_id(),
                    timestamp = %event.timestamp,
                    "span event: {}",
                    event.name
                );
            }
        }
        Ok(())
    }
}

/// Keeps finished spans in memory.
///
/// Clones share the same storage, so a test can hand one clone to the
/// pipeline and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct InMemorySpanExporter {
    spans: Arc<Mutex<Vec<SpanData>>>,
}

impl InMemorySpanExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything exported so far, in export order
    pub fn finished_spans(&self) -> Vec<SpanData> {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn reset(&self) {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl SpanExporter for InMemorySpanExporter {
    fn export(&self, batch: Vec<SpanData>) -> TelemetryResult<()> {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(batch);
        Ok(())
    }
}
