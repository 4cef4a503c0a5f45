//! Tracer provider: owns the sampling and processing pipeline.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::BatchConfig;
use tracing::warn;

use super::tracer::Tracer;
use crate::error::{TelemetryError, TelemetryResult};
use crate::export::SpanExporter;
use crate::id_generator::{IdGenerator, RandomIdGenerator};
use crate::processor::{BatchSpanProcessor, SimpleSpanProcessor, SpanProcessor};
use crate::sampler::Sampler;

pub(crate) struct ProviderInner {
    pub(crate) processors: Vec<Arc<dyn SpanProcessor>>,
    pub(crate) sampler: Sampler,
    pub(crate) id_generator: Arc<dyn IdGenerator>,
    is_shutdown: AtomicBool,
}

impl ProviderInner {
    pub(crate) fn is_shutdown(&self) -> bool {
        self.is_shutdown.load(Ordering::Acquire)
    }
}

/// Creates tracers that share one pipeline. Cheap to clone.
#[derive(Clone)]
pub struct TracerProvider {
    inner: Arc<ProviderInner>,
}

impl TracerProvider {
    pub fn builder() -> TracerProviderBuilder {
        TracerProviderBuilder::default()
    }

    /// Tracer whose spans carry `name` as instrumentation scope.
    pub fn tracer(&self, name: impl Into<String>) -> Tracer {
        Tracer::new(name.into(), self.inner.clone())
    }

    pub fn sampler(&self) -> &Sampler {
        &self.inner.sampler
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.is_shutdown()
    }

    /// Flush every processor; the last failure is returned.
    pub async fn force_flush(&self) -> TelemetryResult<()> {
        let mut result = Ok(());
        for processor in &self.inner.processors {
            if let Err(e) = processor.force_flush().await {
                warn!(error = %e, "Span processor flush failed");
                result = Err(e);
            }
        }
        result
    }

    /// Shut every processor down. Spans started afterwards do not record.
    pub async fn shutdown(&self) -> TelemetryResult<()> {
        if self.inner.is_shutdown.swap(true, Ordering::AcqRel) {
            return Err(TelemetryError::AlreadyShutdown);
        }

        let mut result = Ok(());
        for processor in &self.inner.processors {
            if let Err(e) = processor.shutdown().await {
                warn!(error = %e, "Span processor shutdown failed");
                result = Err(e);
            }
        }
        result
    }
}

impl fmt::Debug for TracerProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracerProvider")
            .field("processors", &self.inner.processors.len())
            .field("sampler", &self.inner.sampler)
            .field("id_generator", &self.inner.id_generator)
            .field("is_shutdown", &self.is_shutdown())
            .finish()
    }
}

/// Builder for [`TracerProvider`].
#[derive(Default)]
pub struct TracerProviderBuilder {
    processors: Vec<Arc<dyn SpanProcessor>>,
    sampler: Option<Sampler>,
    id_generator: Option<Arc<dyn IdGenerator>>,
}

impl TracerProviderBuilder {
    pub fn with_span_processor(mut self, processor: impl SpanProcessor + 'static) -> Self {
        self.processors.push(Arc::new(processor));
        self
    }

    /// Export every span synchronously as it ends.
    pub fn with_simple_exporter(self, exporter: impl SpanExporter + 'static) -> Self {
        self.with_span_processor(SimpleSpanProcessor::new(Arc::new(exporter)))
    }

    /// Export spans in batches from a background task. Needs a tokio runtime.
    pub fn with_batch_exporter(self, exporter: impl SpanExporter + 'static, config: BatchConfig) -> Self {
        self.with_span_processor(BatchSpanProcessor::new(Arc::new(exporter), config))
    }

    pub fn with_sampler(mut self, sampler: Sampler) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn with_id_generator(mut self, id_generator: impl IdGenerator + 'static) -> Self {
        self.id_generator = Some(Arc::new(id_generator));
        self
    }

    pub fn build(self) -> TracerProvider {
        TracerProvider {
            inner: Arc::new(ProviderInner {
                processors: self.processors,
                sampler: self.sampler.unwrap_or_default(),
                id_generator: self
                    .id_generator
                    .unwrap_or_else(|| Arc::new(RandomIdGenerator)),
                is_shutdown: AtomicBool::new(false),
            }),
        }
    }
}
