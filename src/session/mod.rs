//! Logical sessions.
//!
//! # Data Flow
//! ```text
//! Caller executes SQL on a statement
//!     → statement.rs (classify: plain per execute, prepared once)
//!     → router.rs (write bound? use it : bind read or write lazily)
//!     → Backend statement on the chosen connection
//! ```
//!
//! A `Session` is owned by one caller and every operation takes `&mut self`;
//! statements are addressed by [`StatementId`] and closed with the session.

pub mod router;
pub mod statement;
pub mod unsupported;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::backend::{
    BackendPair, Credentials, DatabaseMetadata, ExecuteOutcome, IsolationLevel, Role, Value,
};
use crate::error::{Result, RouterError};
use crate::sql::StatementKind;

pub use router::{Binding, SessionRouter, SessionSettings};
pub use statement::{StatementId, StatementOptions};
pub use unsupported::ClientOperation;

use statement::StatementHandle;

/// One caller-visible connection over up to two backend connections.
pub struct Session {
    router: SessionRouter,
    statements: BTreeMap<StatementId, StatementHandle>,
    next_statement: u64,
    closed: bool,
}

impl Session {
    pub fn new(pair: Arc<BackendPair>, credentials: Option<Credentials>) -> Self {
        let router = SessionRouter::new(pair, credentials);
        tracing::debug!(session_id = %router.id(), "Session opened");
        Self {
            router,
            statements: BTreeMap::new(),
            next_statement: 0,
            closed: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.router.id()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(RouterError::closed("session"));
        }
        Ok(())
    }

    fn statement_mut(&mut self, id: StatementId) -> Result<&mut StatementHandle> {
        self.ensure_open()?;
        self.statements
            .get_mut(&id)
            .ok_or_else(|| RouterError::closed("statement"))
    }

    fn statement(&self, id: StatementId) -> Result<&StatementHandle> {
        self.ensure_open()?;
        self.statements
            .get(&id)
            .ok_or_else(|| RouterError::closed("statement"))
    }

    fn track(&mut self, handle: StatementHandle) -> StatementId {
        self.next_statement += 1;
        let id = StatementId(self.next_statement);
        self.statements.insert(id, handle);
        id
    }

    /// Create a plain statement. No backend connection is bound until it
    /// executes.
    pub fn create_statement(&mut self) -> Result<StatementId> {
        self.ensure_open()?;
        Ok(self.track(StatementHandle::plain()))
    }

    /// Prepare a statement. The SQL is classified now and the statement is
    /// routed by that classification on every execution.
    pub fn prepare(&mut self, sql: &str) -> Result<StatementId> {
        self.ensure_open()?;
        let handle = StatementHandle::prepared(sql)?;
        Ok(self.track(handle))
    }

    pub async fn execute(&mut self, id: StatementId, sql: &str) -> Result<ExecuteOutcome> {
        self.ensure_open()?;
        let statement = self
            .statements
            .get_mut(&id)
            .ok_or_else(|| RouterError::closed("statement"))?;
        statement.execute(&mut self.router, sql).await
    }

    pub async fn execute_prepared(&mut self, id: StatementId) -> Result<ExecuteOutcome> {
        self.ensure_open()?;
        let statement = self
            .statements
            .get_mut(&id)
            .ok_or_else(|| RouterError::closed("statement"))?;
        statement.execute_prepared(&mut self.router).await
    }

    /// Bind a prepared statement parameter. Indexes start at 1.
    pub fn set_parameter(&mut self, id: StatementId, index: usize, value: impl Into<Value>) -> Result<()> {
        self.statement_mut(id)?.set_parameter(index, value.into())
    }

    pub fn clear_parameters(&mut self, id: StatementId) -> Result<()> {
        self.statement_mut(id)?.clear_parameters()
    }

    /// Zero disables the timeout. Pushed to the backend statement when one
    /// is bound.
    pub async fn set_query_timeout(&mut self, id: StatementId, timeout: Duration) -> Result<()> {
        self.statement_mut(id)?.set_query_timeout(timeout).await
    }

    pub async fn set_fetch_size(&mut self, id: StatementId, rows: u32) -> Result<()> {
        self.statement_mut(id)?.set_fetch_size(rows).await
    }

    pub async fn set_max_rows(&mut self, id: StatementId, rows: u64) -> Result<()> {
        self.statement_mut(id)?.set_max_rows(rows).await
    }

    pub fn statement_options(&self, id: StatementId) -> Result<StatementOptions> {
        Ok(self.statement(id)?.options())
    }

    pub fn statement_kind(&self, id: StatementId) -> Result<Option<StatementKind>> {
        Ok(self.statement(id)?.kind())
    }

    /// Endpoint the statement last executed against.
    pub fn statement_endpoint(&self, id: StatementId) -> Result<Option<Role>> {
        Ok(self.statement(id)?.endpoint())
    }

    pub fn last_outcome(&self, id: StatementId) -> Result<Option<&ExecuteOutcome>> {
        Ok(self.statement(id)?.last_outcome())
    }

    /// Close one statement and stop tracking it.
    pub async fn close_statement(&mut self, id: StatementId) -> Result<()> {
        self.ensure_open()?;
        match self.statements.remove(&id) {
            Some(mut statement) => Ok(statement.close().await?),
            None => Ok(()),
        }
    }

    /// Reject an operation the router cannot route.
    pub fn perform(&mut self, operation: ClientOperation) -> Result<()> {
        self.ensure_open()?;
        Err(unsupported::reject(operation))
    }

    pub fn auto_commit(&self) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.router.settings().auto_commit)
    }

    pub fn transaction_isolation(&self) -> Result<Option<IsolationLevel>> {
        self.ensure_open()?;
        Ok(self.router.settings().isolation)
    }

    pub fn catalog(&self) -> Result<Option<&str>> {
        self.ensure_open()?;
        Ok(self.router.settings().catalog.as_deref())
    }

    pub async fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()> {
        self.ensure_open()?;
        self.router.set_auto_commit(auto_commit).await
    }

    pub async fn set_transaction_isolation(&mut self, level: IsolationLevel) -> Result<()> {
        self.ensure_open()?;
        self.router.set_transaction_isolation(level).await
    }

    pub async fn set_catalog(&mut self, catalog: &str) -> Result<()> {
        self.ensure_open()?;
        self.router.set_catalog(catalog).await
    }

    pub async fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.router.commit().await
    }

    pub async fn rollback(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.router.rollback().await
    }

    /// Backend metadata, from the read connection if one is bound.
    pub async fn metadata(&mut self) -> Result<DatabaseMetadata> {
        self.ensure_open()?;
        let connection = self.router.metadata_connection().await?;
        Ok(connection.metadata().await?)
    }

    pub async fn warnings(&self) -> Result<Vec<String>> {
        self.ensure_open()?;
        self.router.warnings().await
    }

    pub async fn clear_warnings(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.router.clear_warnings().await
    }

    pub fn read_endpoint(&self) -> Option<Role> {
        self.router.read_endpoint()
    }

    pub fn write_endpoint(&self) -> Option<Role> {
        self.router.write_endpoint()
    }

    /// Close every statement, then both connections.
    ///
    /// All closes are attempted even when some fail; the last failure is
    /// returned. Closing a closed session does nothing.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut last = None;
        for (id, mut statement) in std::mem::take(&mut self.statements) {
            if let Err(e) = statement.close().await {
                tracing::warn!(session_id = %self.id(), statement = %id, error = %e, "Failed to close statement");
                last = Some(e);
            }
        }
        if let Some(e) = self.router.close_connections().await {
            last = Some(e);
        }

        tracing::debug!(session_id = %self.id(), "Session closed");
        match last {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.closed {
            tracing::debug!(
                session_id = %self.router.id(),
                "Session dropped without close, backend connections released by drop"
            );
        }
    }
}
