//! Wiring of provider and propagator from configuration.

use std::fmt;
use std::sync::Arc;

use common::{ExporterKind, PropagatorKind, TelemetryConfig};
use tracing::info;

use crate::error::{TelemetryError, TelemetryResult};
use crate::export::LoggingSpanExporter;
use crate::propagation::{
    BaggagePropagator, TextMapCompositePropagator, TextMapPropagator, TraceContextPropagator,
};
use crate::sampler::Sampler;
use crate::trace::{Tracer, TracerProvider};

/// A tracer provider paired with the propagator used at process edges.
#[derive(Clone)]
pub struct Telemetry {
    provider: TracerProvider,
    propagator: Arc<dyn TextMapPropagator>,
}

impl Telemetry {
    pub fn new(provider: TracerProvider, propagator: impl TextMapPropagator + 'static) -> Self {
        Self {
            provider,
            propagator: Arc::new(propagator),
        }
    }

    /// Build the pipeline described by `config`.
    ///
    /// The logging exporter runs behind a batch processor, so this must be
    /// called inside a tokio runtime.
    pub fn from_config(config: &TelemetryConfig) -> TelemetryResult<Self> {
        validate(config)?;

        let mut builder = TracerProvider::builder()
            .with_sampler(Sampler::from_kind(config.sampler, config.sampler_ratio));

        builder = match config.exporter {
            ExporterKind::Logging => builder.with_batch_exporter(
                LoggingSpanExporter::new(config.service_name.clone()),
                config.batch.clone(),
            ),
            ExporterKind::None => builder,
        };

        let propagator = propagator_for(&config.propagators);
        info!(
            service = %config.service_name,
            sampler = ?config.sampler,
            exporter = ?config.exporter,
            propagation_fields = ?propagator.fields(),
            "Telemetry initialized"
        );

        Ok(Self::new(builder.build(), propagator))
    }

    /// Pipeline that records nothing and propagates nothing.
    pub fn disabled() -> Self {
        Self::new(
            TracerProvider::builder().with_sampler(Sampler::AlwaysOff).build(),
            TextMapCompositePropagator::default(),
        )
    }

    pub fn tracer(&self, name: impl Into<String>) -> Tracer {
        self.provider.tracer(name)
    }

    pub fn provider(&self) -> &TracerProvider {
        &self.provider
    }

    pub fn propagator(&self) -> &dyn TextMapPropagator {
        self.propagator.as_ref()
    }

    pub async fn force_flush(&self) -> TelemetryResult<()> {
        self.provider.force_flush().await
    }

    /// Flush queued spans and stop the pipeline.
    pub async fn shutdown(&self) -> TelemetryResult<()> {
        self.provider.shutdown().await
    }
}

impl fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemetry")
            .field("provider", &self.provider)
            .field("propagator", &self.propagator)
            .finish()
    }
}

/// Reject settings the pipeline cannot run with. Configs loaded from the
/// environment already pass; hand-built ones may not.
fn validate(config: &TelemetryConfig) -> TelemetryResult<()> {
    if !(0.0..=1.0).contains(&config.sampler_ratio) {
        return Err(TelemetryError::config(format!(
            "sampler ratio must be within [0, 1], got {}",
            config.sampler_ratio
        )));
    }

    let batch = &config.batch;
    if batch.max_queue_size == 0 || batch.max_export_batch_size == 0 {
        return Err(TelemetryError::config("batch processor sizes must be positive"));
    }
    if batch.max_export_batch_size > batch.max_queue_size {
        return Err(TelemetryError::config(format!(
            "export batch size {} exceeds queue size {}",
            batch.max_export_batch_size, batch.max_queue_size
        )));
    }

    Ok(())
}

fn propagator_for(kinds: &[PropagatorKind]) -> TextMapCompositePropagator {
    TextMapCompositePropagator::new(
        kinds
            .iter()
            .map(|kind| -> Box<dyn TextMapPropagator> {
                match kind {
                    PropagatorKind::TraceContext => Box::new(TraceContextPropagator::new()),
                    PropagatorKind::Baggage => Box::new(BaggagePropagator::new()),
                }
            })
            .collect(),
    )
}
