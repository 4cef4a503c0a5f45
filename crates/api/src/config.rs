//! API service configuration.

use common::{AppResult, ServiceConfig, TelemetryConfig};

/// Everything the HTTP service needs at startup.
#[derive(Debug, Clone, Default)]
pub struct ApiConfig {
    pub service: ServiceConfig,
    pub telemetry: TelemetryConfig,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            service: ServiceConfig::from_env()?,
            telemetry: TelemetryConfig::from_env()?,
        })
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            service: ServiceConfig::from_lookup(&lookup)?,
            telemetry: TelemetryConfig::from_lookup(&lookup)?,
        })
    }

    /// Replace the configured host and port with command-line values.
    pub fn override_listen(&mut self, host: Option<String>, port: Option<u16>) {
        if let Some(host) = host {
            self.service.host = host;
        }
        if let Some(port) = port {
            self.service.port = port;
        }
    }

    /// `host:port` to bind
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.service.host, self.service.port)
    }
}
