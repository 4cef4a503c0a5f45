//! Span processors: the hand-off between ending a span and exporting it.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::BatchConfig;
use domain::SpanData;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::{TelemetryError, TelemetryResult};
use crate::export::SpanExporter;

/// Receives every finished, sampled span.
#[async_trait]
pub trait SpanProcessor: Send + Sync {
    /// Called synchronously when a recording span ends. Must not block.
    fn on_end(&self, span: SpanData);

    /// Export everything received so far.
    async fn force_flush(&self) -> TelemetryResult<()>;

    /// Flush and release the exporter. Later spans are ignored.
    async fn shutdown(&self) -> TelemetryResult<()>;
}

// =============================================================================
// Simple processor
// =============================================================================

/// Exports each span as soon as it ends, on the caller's thread.
pub struct SimpleSpanProcessor {
    exporter: Arc<dyn SpanExporter>,
    is_shutdown: AtomicBool,
}

impl SimpleSpanProcessor {
    pub fn new(exporter: Arc<dyn SpanExporter>) -> Self {
        Self {
            exporter,
            is_shutdown: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl SpanProcessor for SimpleSpanProcessor {
    fn on_end(&self, span: SpanData) {
        if self.is_shutdown.load(Ordering::Acquire) {
            return;
        }
        if let Err(e) = self.exporter.export(vec![span]) {
            warn!(error = %e, "Failed to export span");
        }
    }

    async fn force_flush(&self) -> TelemetryResult<()> {
        Ok(())
    }

    async fn shutdown(&self) -> TelemetryResult<()> {
        if self.is_shutdown.swap(true, Ordering::AcqRel) {
            return Err(TelemetryError::AlreadyShutdown);
        }
        self.exporter.shutdown()
    }
}

// =============================================================================
// Batch processor
// =============================================================================

enum ControlMessage {
    Flush(oneshot::Sender<TelemetryResult<()>>),
    Shutdown(oneshot::Sender<TelemetryResult<()>>),
}

/// Queues spans and exports them in batches from a background task.
///
/// Must be created inside a tokio runtime. When the queue is full, new
/// spans are dropped and counted.
pub struct BatchSpanProcessor {
    span_tx: mpsc::Sender<SpanData>,
    control_tx: mpsc::UnboundedSender<ControlMessage>,
    dropped_spans: AtomicUsize,
    is_shutdown: AtomicBool,
}

impl BatchSpanProcessor {
    pub fn new(exporter: Arc<dyn SpanExporter>, config: BatchConfig) -> Self {
        let (span_tx, span_rx) = mpsc::channel(config.max_queue_size.max(1));
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        tokio::spawn(run_worker(exporter, config, span_rx, control_rx));

        Self {
            span_tx,
            control_tx,
            dropped_spans: AtomicUsize::new(0),
            is_shutdown: AtomicBool::new(false),
        }
    }

    /// Spans rejected because the queue was full
    pub fn dropped_spans(&self) -> usize {
        self.dropped_spans.load(Ordering::Relaxed)
    }

    async fn send_control(
        &self,
        message: impl FnOnce(oneshot::Sender<TelemetryResult<()>>) -> ControlMessage,
    ) -> TelemetryResult<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.control_tx
            .send(message(reply_tx))
            .map_err(|_| TelemetryError::ChannelClosed)?;
        reply_rx.await.map_err(|_| TelemetryError::ChannelClosed)?
    }
}

#[async_trait]
impl SpanProcessor for BatchSpanProcessor {
    fn on_end(&self, span: SpanData) {
        if self.is_shutdown.load(Ordering::Acquire) {
            return;
        }
        match self.span_tx.try_send(span) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                let dropped = self.dropped_spans.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(dropped, "Span queue full, dropping span");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Span worker stopped, dropping span");
            }
        }
    }

    async fn force_flush(&self) -> TelemetryResult<()> {
        if self.is_shutdown.load(Ordering::Acquire) {
            return Err(TelemetryError::AlreadyShutdown);
        }
        self.send_control(ControlMessage::Flush).await
    }

    async fn shutdown(&self) -> TelemetryResult<()> {
        if self.is_shutdown.swap(true, Ordering::AcqRel) {
            return Err(TelemetryError::AlreadyShutdown);
        }
        let result = self.send_control(ControlMessage::Shutdown).await;
        if self.dropped_spans() > 0 {
            warn!(dropped = self.dropped_spans(), "Spans were dropped because the queue was full");
        }
        result
    }
}

async fn run_worker(
    exporter: Arc<dyn SpanExporter>,
    config: BatchConfig,
    mut span_rx: mpsc::Receiver<SpanData>,
    mut control_rx: mpsc::UnboundedReceiver<ControlMessage>,
) {
    let max_batch = config.max_export_batch_size.max(1);
    let mut buffer: Vec<SpanData> = Vec::with_capacity(max_batch);
    let delay = config.scheduled_delay.max(Duration::from_millis(1));
    let mut ticker = time::interval_at(Instant::now() + delay, delay);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            Some(span) = span_rx.recv() => {
                buffer.push(span);
                if buffer.len() >= max_batch {
                    let _ = export_buffered(exporter.as_ref(), &mut buffer, max_batch);
                }
            }
            _ = ticker.tick() => {
                let _ = export_buffered(exporter.as_ref(), &mut buffer, max_batch);
            }
            message = control_rx.recv() => {
                drain_queue(&mut span_rx, &mut buffer);
                let flushed = export_buffered(exporter.as_ref(), &mut buffer, max_batch);
                match message {
                    Some(ControlMessage::Flush(reply)) => {
                        let _ = reply.send(flushed);
                    }
                    Some(ControlMessage::Shutdown(reply)) => {
                        let _ = reply.send(flushed.and_then(|()| exporter.shutdown()));
                        break;
                    }
                    // Processor dropped without shutdown
                    None => break,
                }
            }
        }
    }

    debug!("Span worker stopped");
}

fn drain_queue(span_rx: &mut mpsc::Receiver<SpanData>, buffer: &mut Vec<SpanData>) {
    while let Ok(span) = span_rx.try_recv() {
        buffer.push(span);
    }
}

/// Export the buffer in chunks of at most `max_batch` spans.
///
/// Every chunk is attempted; the last failure is returned.
fn export_buffered(
    exporter: &dyn SpanExporter,
    buffer: &mut Vec<SpanData>,
    max_batch: usize,
) -> TelemetryResult<()> {
    let mut result = Ok(());
    while !buffer.is_empty() {
        let take = buffer.len().min(max_batch);
        let batch: Vec<SpanData> = buffer.drain(..take).collect();
        if let Err(e) = exporter.export(batch) {
            warn!(error = %e, "Failed to export span batch");
            result = Err(e);
        }
    }
    result
}
