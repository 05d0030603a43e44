//! Backend capability traits.
//!
//! The router needs a handful of operations from a database client, not a
//! whole client API. Drivers implement these traits; anything else the
//! caller needs is rejected at the session boundary.

use std::time::Duration;

use async_trait::async_trait;

use crate::backend::types::{Credentials, DatabaseMetadata, ExecuteOutcome, IsolationLevel, Value};
use crate::error::BackendError;

/// Result type for collaborator calls.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Opens connections to one backend.
#[async_trait]
pub trait ConnectionFactory: Send + Sync + std::fmt::Debug {
    /// Open a connection with the factory's own credentials.
    async fn connect(&self) -> BackendResult<Box<dyn BackendConnection>>;

    /// Open a connection with explicit credentials.
    async fn connect_with(
        &self,
        credentials: &Credentials,
    ) -> BackendResult<Box<dyn BackendConnection>>;
}

/// A physical connection to a backend.
///
/// New connections start in autocommit mode with the driver's default
/// isolation level and catalog.
#[async_trait]
pub trait BackendConnection: Send + Sync {
    async fn create_statement(&self) -> BackendResult<Box<dyn BackendStatement>>;

    async fn prepare(&self, sql: &str) -> BackendResult<Box<dyn BackendPreparedStatement>>;

    async fn set_auto_commit(&self, auto_commit: bool) -> BackendResult<()>;

    async fn set_transaction_isolation(&self, level: IsolationLevel) -> BackendResult<()>;

    async fn set_catalog(&self, catalog: &str) -> BackendResult<()>;

    async fn commit(&self) -> BackendResult<()>;

    async fn rollback(&self) -> BackendResult<()>;

    async fn metadata(&self) -> BackendResult<DatabaseMetadata>;

    async fn warnings(&self) -> BackendResult<Vec<String>>;

    async fn clear_warnings(&self) -> BackendResult<()>;

    async fn close(&self) -> BackendResult<()>;
}

/// Options and lifecycle shared by plain and prepared statements.
#[async_trait]
pub trait StatementSettings: Send {
    async fn set_query_timeout(&mut self, timeout: Duration) -> BackendResult<()>;

    async fn set_fetch_size(&mut self, rows: u32) -> BackendResult<()>;

    async fn set_max_rows(&mut self, rows: u64) -> BackendResult<()>;

    async fn close(&mut self) -> BackendResult<()>;
}

/// A plain statement; SQL text is supplied per execution.
#[async_trait]
pub trait BackendStatement: StatementSettings {
    async fn execute(&mut self, sql: &str) -> BackendResult<ExecuteOutcome>;
}

/// A prepared statement; SQL text is fixed at prepare time.
#[async_trait]
pub trait BackendPreparedStatement: StatementSettings {
    async fn execute(&mut self, params: &[Value]) -> BackendResult<ExecuteOutcome>;
}
