//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Router::builder().build()
//!     → BackendPair + HealthMonitor constructed together (permits allocated)
//! Router::start_health_checks(&Shutdown)
//!     → one probe loop per endpoint, each subscribed to the shutdown signal
//! Shutdown::trigger()
//!     → probe loops exit after their current round
//! ```
//!
//! # Design Decisions
//! - Background work is only ever the health monitor
//! - Sessions are closed by their owners, not by shutdown

pub mod shutdown;

pub use shutdown::Shutdown;
