//! Shared utilities for integration testing.
//!
//! `ScriptedBackend` is an in-memory connection factory that records every
//! call made through it, tagged with the backend's name, and can be told to
//! fail specific operations.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use rw_router::backend::{
    BackendConnection, BackendPreparedStatement, BackendResult, BackendStatement,
    ConnectionFactory, Credentials, DatabaseMetadata, ExecuteOutcome, IsolationLevel,
    StatementSettings, Value,
};
use rw_router::BackendError;

pub type CallLog = Arc<Mutex<Vec<String>>>;

#[derive(Debug, Default)]
struct Faults {
    connects: AtomicUsize,
    executes: AtomicUsize,
    connection_close: AtomicBool,
    statement_close: AtomicBool,
    commit: AtomicBool,
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[derive(Debug)]
pub struct ScriptedBackend {
    name: &'static str,
    log: CallLog,
    faults: Arc<Faults>,
    warnings: Arc<Mutex<Vec<String>>>,
}

impl ScriptedBackend {
    /// A backend that writes into its own log.
    pub fn new(name: &'static str) -> Arc<Self> {
        Self::with_log(name, CallLog::default())
    }

    /// A backend sharing a log with others, so call order across backends
    /// is visible.
    pub fn with_log(name: &'static str, log: CallLog) -> Arc<Self> {
        Arc::new(Self {
            name,
            log,
            faults: Arc::default(),
            warnings: Arc::default(),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(self.name))
            .cloned()
            .collect()
    }

    /// Calls with this prefix, e.g. `"master:set_auto_commit"`.
    pub fn count(&self, operation: &str) -> usize {
        let prefix = format!("{}:{}", self.name, operation);
        self.calls().iter().filter(|call| call.starts_with(&prefix)).count()
    }

    pub fn fail_connects(&self, n: usize) {
        self.faults.connects.store(n, Ordering::SeqCst);
    }

    pub fn fail_executes(&self, n: usize) {
        self.faults.executes.store(n, Ordering::SeqCst);
    }

    pub fn fail_connection_close(&self) {
        self.faults.connection_close.store(true, Ordering::SeqCst);
    }

    pub fn fail_statement_close(&self) {
        self.faults.statement_close.store(true, Ordering::SeqCst);
    }

    pub fn fail_commit(&self) {
        self.faults.commit.store(true, Ordering::SeqCst);
    }

    pub fn push_warning(&self, warning: &str) {
        self.warnings.lock().unwrap().push(warning.to_string());
    }

    fn record(&self, call: String) {
        self.log.lock().unwrap().push(format!("{}:{}", self.name, call));
    }

    fn open(&self) -> BackendResult<Box<dyn BackendConnection>> {
        if take_one(&self.faults.connects) {
            return Err(BackendError::new(format!("{} is down", self.name)));
        }
        Ok(Box::new(ScriptedConnection {
            backend: Handle {
                name: self.name,
                log: self.log.clone(),
                faults: self.faults.clone(),
            },
            warnings: self.warnings.clone(),
        }))
    }
}

#[async_trait]
impl ConnectionFactory for ScriptedBackend {
    async fn connect(&self) -> BackendResult<Box<dyn BackendConnection>> {
        self.record("connect".into());
        self.open()
    }

    async fn connect_with(
        &self,
        credentials: &Credentials,
    ) -> BackendResult<Box<dyn BackendConnection>> {
        self.record(format!("connect_with({})", credentials.username));
        self.open()
    }
}

#[derive(Clone)]
struct Handle {
    name: &'static str,
    log: CallLog,
    faults: Arc<Faults>,
}

impl Handle {
    fn record(&self, call: String) {
        self.log.lock().unwrap().push(format!("{}:{}", self.name, call));
    }

    fn fail(&self, operation: &str) -> BackendError {
        BackendError::new(format!("{} {} failed", self.name, operation))
    }
}

struct ScriptedConnection {
    backend: Handle,
    warnings: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl BackendConnection for ScriptedConnection {
    async fn create_statement(&self) -> BackendResult<Box<dyn BackendStatement>> {
        self.backend.record("create_statement".into());
        Ok(Box::new(ScriptedStatement {
            backend: self.backend.clone(),
        }))
    }

    async fn prepare(&self, sql: &str) -> BackendResult<Box<dyn BackendPreparedStatement>> {
        self.backend.record(format!("prepare({})", sql));
        Ok(Box::new(ScriptedStatement {
            backend: self.backend.clone(),
        }))
    }

    async fn set_auto_commit(&self, auto_commit: bool) -> BackendResult<()> {
        self.backend.record(format!("set_auto_commit({})", auto_commit));
        Ok(())
    }

    async fn set_transaction_isolation(&self, level: IsolationLevel) -> BackendResult<()> {
        self.backend.record(format!("set_transaction_isolation({})", level));
        Ok(())
    }

    async fn set_catalog(&self, catalog: &str) -> BackendResult<()> {
        self.backend.record(format!("set_catalog({})", catalog));
        Ok(())
    }

    async fn commit(&self) -> BackendResult<()> {
        self.backend.record("commit".into());
        if self.backend.faults.commit.load(Ordering::SeqCst) {
            return Err(self.backend.fail("commit"));
        }
        Ok(())
    }

    async fn rollback(&self) -> BackendResult<()> {
        self.backend.record("rollback".into());
        Ok(())
    }

    async fn metadata(&self) -> BackendResult<DatabaseMetadata> {
        self.backend.record("metadata".into());
        Ok(DatabaseMetadata {
            product_name: self.backend.name.to_string(),
            product_version: "1.0".into(),
            ..Default::default()
        })
    }

    async fn warnings(&self) -> BackendResult<Vec<String>> {
        self.backend.record("warnings".into());
        Ok(self.warnings.lock().unwrap().clone())
    }

    async fn clear_warnings(&self) -> BackendResult<()> {
        self.backend.record("clear_warnings".into());
        self.warnings.lock().unwrap().clear();
        Ok(())
    }

    async fn close(&self) -> BackendResult<()> {
        self.backend.record("close".into());
        if self.backend.faults.connection_close.load(Ordering::SeqCst) {
            return Err(self.backend.fail("close"));
        }
        Ok(())
    }
}

struct ScriptedStatement {
    backend: Handle,
}

impl ScriptedStatement {
    fn run(&self, call: String) -> BackendResult<ExecuteOutcome> {
        self.backend.record(call);
        if take_one(&self.backend.faults.executes) {
            return Err(self.backend.fail("execute"));
        }
        Ok(ExecuteOutcome::UpdateCount(1))
    }
}

#[async_trait]
impl StatementSettings for ScriptedStatement {
    async fn set_query_timeout(&mut self, timeout: Duration) -> BackendResult<()> {
        self.backend.record(format!("set_query_timeout({}s)", timeout.as_secs()));
        Ok(())
    }

    async fn set_fetch_size(&mut self, rows: u32) -> BackendResult<()> {
        self.backend.record(format!("set_fetch_size({})", rows));
        Ok(())
    }

    async fn set_max_rows(&mut self, rows: u64) -> BackendResult<()> {
        self.backend.record(format!("set_max_rows({})", rows));
        Ok(())
    }

    async fn close(&mut self) -> BackendResult<()> {
        self.backend.record("statement_close".into());
        if self.backend.faults.statement_close.load(Ordering::SeqCst) {
            return Err(self.backend.fail("statement close"));
        }
        Ok(())
    }
}

#[async_trait]
impl BackendStatement for ScriptedStatement {
    async fn execute(&mut self, sql: &str) -> BackendResult<ExecuteOutcome> {
        self.run(format!("execute({})", sql))
    }
}

#[async_trait]
impl BackendPreparedStatement for ScriptedStatement {
    async fn execute(&mut self, params: &[Value]) -> BackendResult<ExecuteOutcome> {
        self.run(format!("execute_prepared({} params)", params.len()))
    }
}
