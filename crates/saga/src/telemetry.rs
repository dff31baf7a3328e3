//! # Telemetry
//!
//! Tracing initialization for provisioning workers. Step execution,
//! retries and compensation outcomes are emitted as structured events by
//! the controller; this module only wires up the subscriber.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Configuration for telemetry initialization.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name for tracing.
    pub service_name: String,
    /// Log level filter (EnvFilter syntax).
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "tenant-provisioner".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Guard kept alive for the lifetime of the process.
pub struct TelemetryGuard;

impl TelemetryGuard {
    pub fn shutdown(self) {}
}

/// Initialize tracing for the provisioner. Call once at startup.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryGuard {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::debug!(service = %config.service_name, "telemetry initialized");
    TelemetryGuard
}
