//! Metrics collection.
//!
//! # Metrics
//! - `rw_router_backend_available` (gauge): 1=available, 0=unavailable, by endpoint
//! - `rw_router_probe_failures_total` (counter): failed probe attempts, by endpoint
//! - `rw_router_connections_opened_total` (counter): physical connections, by endpoint
//! - `rw_router_statements_total` (counter): routed statements, by kind and target
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; without an installed recorder
//!   every call is a no-op
//! - Exporters are the embedding application's choice

use std::sync::atomic::{AtomicBool, Ordering};

use crate::backend::Role;
use crate::sql::StatementKind;

static ENABLED: AtomicBool = AtomicBool::new(true);

/// Turn recording on or off process-wide.
pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

fn enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

pub fn record_backend_available(role: Role, available: bool) {
    if enabled() {
        metrics::gauge!("rw_router_backend_available", "endpoint" => role.as_str())
            .set(if available { 1.0 } else { 0.0 });
    }
}

pub fn record_probe_failure(role: Role) {
    if enabled() {
        metrics::counter!("rw_router_probe_failures_total", "endpoint" => role.as_str())
            .increment(1);
    }
}

pub fn record_connection_opened(role: Role) {
    if enabled() {
        metrics::counter!("rw_router_connections_opened_total", "endpoint" => role.as_str())
            .increment(1);
    }
}

pub fn record_statement(kind: StatementKind, target: Role) {
    if enabled() {
        metrics::counter!(
            "rw_router_statements_total",
            "kind" => kind.as_str(),
            "endpoint" => target.as_str()
        )
        .increment(1);
    }
}
