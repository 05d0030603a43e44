//! Backend subsystem.
//!
//! # Data Flow
//! ```text
//! Session needs a connection
//!     → pair.rs (resolve read or write endpoint from availability)
//!     → endpoint.rs (factory + available flag)
//!     → connection.rs (collaborator traits: factory, connection, statements)
//!     → Return a physical connection or the backend's own error
//! ```
//!
//! # Design Decisions
//! - Availability flags are the only state shared with the health monitor
//! - Routing never blocks on the monitor: flags are atomics
//! - The router never retries on another endpoint after a connect failure

pub mod connection;
pub mod endpoint;
pub mod pair;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use connection::{
    BackendConnection, BackendPreparedStatement, BackendResult, BackendStatement,
    ConnectionFactory, StatementSettings,
};
pub use endpoint::{BackendEndpoint, Role};
pub use pair::BackendPair;
pub use types::{Credentials, DatabaseMetadata, ExecuteOutcome, IsolationLevel, Row, Value};
