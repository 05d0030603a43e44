//! Read/write splitting router over a master and an optional slave database.
//!
//! ```text
//!   caller ──▶ Session ──▶ statement facade ──▶ classify SQL (sql)
//!                 │
//!                 ▼
//!           SessionRouter ── write bound? ──▶ write connection
//!                 │                 no
//!                 ▼
//!           BackendPair (read: slave if up, write: master) ◀── HealthMonitor
//! ```

// Core
pub mod backend;
pub mod router;
pub mod session;
pub mod sql;

// Background checks
pub mod health;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use config::RouterConfig;
pub use error::{BackendError, Result, RouterError};
pub use lifecycle::Shutdown;
pub use router::{Router, RouterBuilder};
pub use session::Session;
pub use sql::{classify, StatementKind};
