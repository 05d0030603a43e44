//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Routing, sessions and health probes produce:
//!     → logging.rs (structured tracing events, per-session span)
//!     → metrics.rs (counters and gauges)
//! ```
//!
//! # Design Decisions
//! - Structured fields (`session_id`, `endpoint`, `kind`) instead of
//!   formatted messages
//! - Session ID flows through all events of one session
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
