//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Initial delay, then fixed-delay rounds per endpoint
//!     → Acquire a worker permit
//!     → probe.rs (connect + detect statement, retried)
//!     → AvailabilitySink (BackendPair flips the endpoint flag)
//! ```
//!
//! # Design Decisions
//! - Probe failures are logged and absorbed, never raised to callers
//! - Endpoints are probed independently; one slow endpoint does not delay
//!   the other
//! - Worker permits are created with the monitor, not lazily

pub mod active;
pub mod probe;

use crate::backend::Role;

pub use active::HealthMonitor;
pub use probe::{probe_with_retries, ProbeOutcome, ProbeTarget};

/// Receives the outcome of every probe round.
pub trait AvailabilitySink: Send + Sync {
    fn on_available(&self, role: Role);

    fn on_unavailable(&self, role: Role);
}
