//! Configuration schema definitions.
//!
//! This module defines the serializable part of the router configuration.
//! Connection factories are supplied in code through `Router::builder()`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Let the slave take writes while the master is unavailable.
    pub slave_writable: bool,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable active health checks.
    pub enabled: bool,

    /// Delay before the first probe in milliseconds.
    pub initial_delay_ms: u64,

    /// Delay between the end of one probe round and the next, in milliseconds.
    pub monitor_period_ms: u64,

    /// Attempts per round before an endpoint is reported unavailable.
    pub recheck_times: u32,

    /// Pause between failed attempts in milliseconds.
    pub recheck_interval_ms: u64,

    /// Statement executed by each probe.
    pub detect_statement: String,

    /// Maximum number of probes running at once.
    pub thread_count: usize,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            initial_delay_ms: 15_000,
            monitor_period_ms: 15_000,
            recheck_times: 3,
            recheck_interval_ms: 1_000,
            detect_statement: "select 1".to_string(),
            thread_count: 2,
        }
    }
}

impl HealthCheckConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn monitor_period(&self) -> Duration {
        Duration::from_millis(self.monitor_period_ms)
    }

    pub fn recheck_interval(&self) -> Duration {
        Duration::from_millis(self.recheck_interval_ms)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Record metrics through the `metrics` facade.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
        }
    }
}
