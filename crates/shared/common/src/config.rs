//! Shared configuration structures.
//!
//! Every loader has a `from_lookup` variant taking a variable lookup so the
//! parsing rules can be exercised without touching the process environment.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_SERVICE_NAME: &str = "otel-ctx-prop";
pub const DEFAULT_PROPAGATORS: &str = "tracecontext,baggage";
pub const DEFAULT_SAMPLER_RATIO: f64 = 1.0;
pub const DEFAULT_BSP_SCHEDULE_DELAY_MS: u64 = 5000;
pub const DEFAULT_BSP_MAX_QUEUE_SIZE: usize = 2048;
pub const DEFAULT_BSP_MAX_EXPORT_BATCH_SIZE: usize = 512;

fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Non-empty, trimmed value of `key`
fn lookup_value<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_value<F, T>(lookup: &F, key: &str, default: T) -> AppResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup_value(lookup, key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::config(format!("{}={:?}: {}", key, raw, e))),
        None => Ok(default),
    }
}

// =============================================================================
// Service
// =============================================================================

/// Base service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Service name for logging and tracing
    pub service_name: String,
    /// Host address to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            service_name: lookup_value(&lookup, "OTEL_SERVICE_NAME")
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            host: lookup_value(&lookup, "SERVER_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
            port: parse_value(&lookup, "SERVER_PORT", DEFAULT_SERVER_PORT)?,
        })
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
        }
    }
}

// =============================================================================
// Telemetry
// =============================================================================

/// Text map propagator selected by `OTEL_PROPAGATORS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropagatorKind {
    TraceContext,
    Baggage,
}

impl PropagatorKind {
    /// Parse a comma-separated list; `none` yields an empty list.
    pub fn parse_list(raw: &str) -> AppResult<Vec<Self>> {
        let mut kinds = Vec::new();
        for name in raw.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            let kind = match name {
                "none" => return Ok(Vec::new()),
                "tracecontext" => PropagatorKind::TraceContext,
                "baggage" => PropagatorKind::Baggage,
                other => return Err(AppError::config(format!("unknown propagator {:?}", other))),
            };
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(kinds)
    }
}

/// Sampler selected by `OTEL_TRACES_SAMPLER`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplerKind {
    AlwaysOn,
    AlwaysOff,
    TraceIdRatio,
    #[default]
    ParentBasedAlwaysOn,
    ParentBasedAlwaysOff,
    ParentBasedTraceIdRatio,
}

impl FromStr for SamplerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always_on" => Ok(SamplerKind::AlwaysOn),
            "always_off" => Ok(SamplerKind::AlwaysOff),
            "traceidratio" => Ok(SamplerKind::TraceIdRatio),
            "parentbased_always_on" => Ok(SamplerKind::ParentBasedAlwaysOn),
            "parentbased_always_off" => Ok(SamplerKind::ParentBasedAlwaysOff),
            "parentbased_traceidratio" => Ok(SamplerKind::ParentBasedTraceIdRatio),
            other => Err(format!("unknown sampler {:?}", other)),
        }
    }
}

/// Span exporter selected by `OTEL_TRACES_EXPORTER`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExporterKind {
    /// Finished spans are written as log events
    #[default]
    Logging,
    None,
}

impl FromStr for ExporterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "logging" => Ok(ExporterKind::Logging),
            "none" => Ok(ExporterKind::None),
            other => Err(format!("unknown exporter {:?}", other)),
        }
    }
}

/// Batch span processor tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Spans buffered before new ones are dropped
    pub max_queue_size: usize,
    /// Upper bound of spans per export call
    pub max_export_batch_size: usize,
    /// Delay between two scheduled exports
    pub scheduled_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_queue_size: DEFAULT_BSP_MAX_QUEUE_SIZE,
            max_export_batch_size: DEFAULT_BSP_MAX_EXPORT_BATCH_SIZE,
            scheduled_delay: Duration::from_millis(DEFAULT_BSP_SCHEDULE_DELAY_MS),
        }
    }
}

/// Telemetry pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub propagators: Vec<PropagatorKind>,
    pub sampler: SamplerKind,
    /// Ratio for the trace-id ratio samplers
    pub sampler_ratio: f64,
    pub exporter: ExporterKind,
    pub batch: BatchConfig,
}

impl TelemetryConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let propagators = PropagatorKind::parse_list(
            &lookup_value(&lookup, "OTEL_PROPAGATORS").unwrap_or_else(|| DEFAULT_PROPAGATORS.to_string()),
        )?;

        let sampler_ratio: f64 = parse_value(&lookup, "OTEL_TRACES_SAMPLER_ARG", DEFAULT_SAMPLER_RATIO)?;
        if !(0.0..=1.0).contains(&sampler_ratio) {
            return Err(AppError::config(format!(
                "OTEL_TRACES_SAMPLER_ARG must be within [0, 1], got {}",
                sampler_ratio
            )));
        }

        let max_export_batch_size = parse_value(
            &lookup,
            "OTEL_BSP_MAX_EXPORT_BATCH_SIZE",
            DEFAULT_BSP_MAX_EXPORT_BATCH_SIZE,
        )?;
        let max_queue_size = parse_value(&lookup, "OTEL_BSP_MAX_QUEUE_SIZE", DEFAULT_BSP_MAX_QUEUE_SIZE)?;
        if max_export_batch_size == 0 || max_queue_size == 0 {
            return Err(AppError::config("batch processor sizes must be positive"));
        }

        Ok(Self {
            service_name: lookup_value(&lookup, "OTEL_SERVICE_NAME")
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            propagators,
            sampler: parse_value(&lookup, "OTEL_TRACES_SAMPLER", SamplerKind::default())?,
            sampler_ratio,
            exporter: parse_value(&lookup, "OTEL_TRACES_EXPORTER", ExporterKind::default())?,
            batch: BatchConfig {
                max_queue_size,
                // A batch never exceeds the queue
                max_export_batch_size: max_export_batch_size.min(max_queue_size),
                scheduled_delay: Duration::from_millis(parse_value(
                    &lookup,
                    "OTEL_BSP_SCHEDULE_DELAY",
                    DEFAULT_BSP_SCHEDULE_DELAY_MS,
                )?),
            },
        })
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            propagators: vec![PropagatorKind::TraceContext, PropagatorKind::Baggage],
            sampler: SamplerKind::default(),
            sampler_ratio: DEFAULT_SAMPLER_RATIO,
            exporter: ExporterKind::default(),
            batch: BatchConfig::default(),
        }
    }
}
