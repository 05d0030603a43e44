//! In-crate test doubles for backend collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::backend::connection::{
    BackendConnection, BackendPreparedStatement, BackendResult, BackendStatement,
    ConnectionFactory, StatementSettings,
};
use crate::backend::types::{Credentials, DatabaseMetadata, ExecuteOutcome, IsolationLevel, Value};
use crate::error::BackendError;

/// Factory that counts connects and can be told to fail the next N.
#[derive(Debug, Default)]
pub struct NamedFactory {
    name: String,
    plain: AtomicUsize,
    credentialed: AtomicUsize,
    failures_left: AtomicUsize,
    closes: Arc<AtomicUsize>,
}

impl NamedFactory {
    pub fn arc(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            ..Default::default()
        })
    }

    pub fn fail_next(&self, attempts: usize) {
        self.failures_left.store(attempts, Ordering::SeqCst);
    }

    pub fn plain_connects(&self) -> usize {
        self.plain.load(Ordering::SeqCst)
    }

    pub fn credentialed_connects(&self) -> usize {
        self.credentialed.load(Ordering::SeqCst)
    }

    pub fn attempts(&self) -> usize {
        self.plain_connects() + self.credentialed_connects()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn open(&self) -> BackendResult<Box<dyn BackendConnection>> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(BackendError::new(format!("{} refused connection", self.name)));
        }
        Ok(Box::new(NullConnection {
            name: self.name.clone(),
            closes: self.closes.clone(),
        }))
    }
}

#[async_trait]
impl ConnectionFactory for NamedFactory {
    async fn connect(&self) -> BackendResult<Box<dyn BackendConnection>> {
        self.plain.fetch_add(1, Ordering::SeqCst);
        self.open()
    }

    async fn connect_with(
        &self,
        _credentials: &Credentials,
    ) -> BackendResult<Box<dyn BackendConnection>> {
        self.credentialed.fetch_add(1, Ordering::SeqCst);
        self.open()
    }
}

struct NullConnection {
    name: String,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl BackendConnection for NullConnection {
    async fn create_statement(&self) -> BackendResult<Box<dyn BackendStatement>> {
        Ok(Box::new(NullStatement))
    }

    async fn prepare(&self, _sql: &str) -> BackendResult<Box<dyn BackendPreparedStatement>> {
        Ok(Box::new(NullStatement))
    }

    async fn set_auto_commit(&self, _auto_commit: bool) -> BackendResult<()> {
        Ok(())
    }

    async fn set_transaction_isolation(&self, _level: IsolationLevel) -> BackendResult<()> {
        Ok(())
    }

    async fn set_catalog(&self, _catalog: &str) -> BackendResult<()> {
        Ok(())
    }

    async fn commit(&self) -> BackendResult<()> {
        Ok(())
    }

    async fn rollback(&self) -> BackendResult<()> {
        Ok(())
    }

    async fn metadata(&self) -> BackendResult<DatabaseMetadata> {
        Ok(DatabaseMetadata {
            product_name: self.name.clone(),
            ..Default::default()
        })
    }

    async fn warnings(&self) -> BackendResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn clear_warnings(&self) -> BackendResult<()> {
        Ok(())
    }

    async fn close(&self) -> BackendResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct NullStatement;

#[async_trait]
impl StatementSettings for NullStatement {
    async fn set_query_timeout(&mut self, _timeout: Duration) -> BackendResult<()> {
        Ok(())
    }

    async fn set_fetch_size(&mut self, _rows: u32) -> BackendResult<()> {
        Ok(())
    }

    async fn set_max_rows(&mut self, _rows: u64) -> BackendResult<()> {
        Ok(())
    }

    async fn close(&mut self) -> BackendResult<()> {
        Ok(())
    }
}

#[async_trait]
impl BackendStatement for NullStatement {
    async fn execute(&mut self, _sql: &str) -> BackendResult<ExecuteOutcome> {
        Ok(ExecuteOutcome::Rows(vec![vec![Value::Int(1)]]))
    }
}

#[async_trait]
impl BackendPreparedStatement for NullStatement {
    async fn execute(&mut self, _params: &[Value]) -> BackendResult<ExecuteOutcome> {
        Ok(ExecuteOutcome::Rows(vec![vec![Value::Int(1)]]))
    }
}
