//! Single-endpoint probing with retries.
//!
//! # Responsibilities
//! - Open a connection and run the detect statement
//! - Retry up to `recheck_times` with a fixed pause between attempts
//! - Release the probe statement and connection on every path

use std::sync::Arc;

use tokio::time;

use crate::backend::{BackendConnection, BackendResult, ConnectionFactory, Role, StatementSettings};
use crate::config::HealthCheckConfig;
use crate::observability::metrics;

/// Outcome of one probe round for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Available,
    Unavailable,
}

/// Something the monitor probes.
#[derive(Debug, Clone)]
pub struct ProbeTarget {
    pub role: Role,
    pub factory: Arc<dyn ConnectionFactory>,
}

impl ProbeTarget {
    pub fn new(role: Role, factory: Arc<dyn ConnectionFactory>) -> Self {
        Self { role, factory }
    }
}

/// Probe a target, retrying on failure.
///
/// Stops at the first successful attempt. Failures are logged, never
/// returned.
pub async fn probe_with_retries(target: &ProbeTarget, config: &HealthCheckConfig) -> ProbeOutcome {
    let attempts = config.recheck_times.max(1);

    for attempt in 1..=attempts {
        match probe_once(target.factory.as_ref(), &config.detect_statement).await {
            Ok(()) => {
                tracing::debug!(endpoint = %target.role, attempt, "Health check passed");
                return ProbeOutcome::Available;
            }
            Err(e) => {
                metrics::record_probe_failure(target.role);
                tracing::warn!(
                    endpoint = %target.role,
                    attempt,
                    attempts,
                    error = %e,
                    "Health check failed"
                );
                if attempt < attempts {
                    time::sleep(config.recheck_interval()).await;
                }
            }
        }
    }

    ProbeOutcome::Unavailable
}

async fn probe_once(factory: &dyn ConnectionFactory, detect_statement: &str) -> BackendResult<()> {
    let connection = factory.connect().await?;
    let result = run_detect(connection.as_ref(), detect_statement).await;
    if let Err(e) = connection.close().await {
        tracing::warn!(error = %e, "Failed to close probe connection");
    }
    result
}

async fn run_detect(connection: &dyn BackendConnection, detect_statement: &str) -> BackendResult<()> {
    let mut statement = connection.prepare(detect_statement).await?;
    let result = statement.execute(&[]).await.map(|_| ());
    if let Err(e) = statement.close().await {
        tracing::warn!(error = %e, statement = detect_statement, "Failed to close probe statement");
    }
    result
}
