//! Statement facades.
//!
//! A facade holds the caller's options and, once executed, one backend
//! statement opened on whichever connection the session router resolved.
//! When a later execution resolves to the other connection (a read
//! statement after the session started writing), the old backend statement
//! is closed and a new one is opened on the write connection.

use std::fmt;
use std::time::Duration;

use crate::backend::{
    BackendPreparedStatement, BackendResult, BackendStatement, ExecuteOutcome,
    Role, StatementSettings, Value,
};
use crate::error::{BackendError, Result, RouterError};
use crate::observability::metrics;
use crate::session::router::{Binding, SessionRouter};
use crate::sql::{classify, StatementKind};

/// Handle to a statement owned by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatementId(pub(crate) u64);

impl fmt::Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stmt-{}", self.0)
    }
}

/// Per-statement options. Zero means "driver default" and is never pushed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatementOptions {
    pub query_timeout: Duration,
    pub fetch_size: u32,
    pub max_rows: u64,
}

impl StatementOptions {
    async fn apply<S>(&self, statement: &mut S) -> BackendResult<()>
    where
        S: StatementSettings + ?Sized,
    {
        if !self.query_timeout.is_zero() {
            statement.set_query_timeout(self.query_timeout).await?;
        }
        if self.fetch_size > 0 {
            statement.set_fetch_size(self.fetch_size).await?;
        }
        if self.max_rows > 0 {
            statement.set_max_rows(self.max_rows).await?;
        }
        Ok(())
    }
}

struct Attached<S: ?Sized> {
    binding: Binding,
    endpoint: Role,
    statement: Box<S>,
}

/// Options, bound backend statement and closed state shared by both facades.
struct StatementCore<S: StatementSettings + ?Sized> {
    attached: Option<Attached<S>>,
    options: StatementOptions,
    last_outcome: Option<ExecuteOutcome>,
    closed: bool,
}

impl<S: StatementSettings + ?Sized> StatementCore<S> {
    fn new() -> Self {
        Self {
            attached: None,
            options: StatementOptions::default(),
            last_outcome: None,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(RouterError::closed("statement"));
        }
        Ok(())
    }

    fn endpoint(&self) -> Option<Role> {
        self.attached.as_ref().map(|attached| attached.endpoint)
    }

    /// Take the backend statement if it belongs to `binding`. A statement
    /// opened for the other binding is closed.
    async fn detach_for(&mut self, binding: Binding) -> Option<Attached<S>> {
        match self.attached.take() {
            Some(attached) if attached.binding == binding => Some(attached),
            Some(mut stale) => {
                if let Err(e) = stale.statement.close().await {
                    tracing::warn!(error = %e, "Failed to close statement on previous connection");
                }
                None
            }
            None => None,
        }
    }

    fn reattach(&mut self, attached: Attached<S>) -> &mut Attached<S> {
        self.attached.insert(attached)
    }

    async fn attach(
        &mut self,
        binding: Binding,
        endpoint: Role,
        mut statement: Box<S>,
    ) -> Result<&mut Attached<S>> {
        if let Err(e) = self.options.apply(statement.as_mut()).await {
            if let Err(close_err) = statement.close().await {
                tracing::warn!(error = %close_err, "Failed to close statement after option failure");
            }
            return Err(e.into());
        }
        Ok(self.attached.insert(Attached {
            binding,
            endpoint,
            statement,
        }))
    }

    async fn set_query_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.ensure_open()?;
        self.options.query_timeout = timeout;
        if let Some(attached) = &mut self.attached {
            if !timeout.is_zero() {
                attached.statement.set_query_timeout(timeout).await?;
            }
        }
        Ok(())
    }

    async fn set_fetch_size(&mut self, rows: u32) -> Result<()> {
        self.ensure_open()?;
        self.options.fetch_size = rows;
        if let Some(attached) = &mut self.attached {
            if rows > 0 {
                attached.statement.set_fetch_size(rows).await?;
            }
        }
        Ok(())
    }

    async fn set_max_rows(&mut self, rows: u64) -> Result<()> {
        self.ensure_open()?;
        self.options.max_rows = rows;
        if let Some(attached) = &mut self.attached {
            if rows > 0 {
                attached.statement.set_max_rows(rows).await?;
            }
        }
        Ok(())
    }

    /// Close the backend statement, if any. Idempotent.
    async fn close(&mut self) -> std::result::Result<(), BackendError> {
        self.closed = true;
        self.last_outcome = None;
        match self.attached.take() {
            Some(mut attached) => attached.statement.close().await,
            None => Ok(()),
        }
    }
}

/// Statement whose SQL is supplied, and classified, per execution.
pub(crate) struct PlainStatement {
    core: StatementCore<dyn BackendStatement>,
    last_kind: Option<StatementKind>,
}

impl PlainStatement {
    fn new() -> Self {
        Self {
            core: StatementCore::new(),
            last_kind: None,
        }
    }

    async fn execute(&mut self, router: &mut SessionRouter, sql: &str) -> Result<ExecuteOutcome> {
        self.core.ensure_open()?;
        let kind = classify(sql)?;
        let routed = router.connection_for(kind.is_read()).await?;

        let attached = match self.core.detach_for(routed.binding).await {
            Some(attached) => self.core.reattach(attached),
            None => {
                let statement = routed.connection.create_statement().await?;
                self.core
                    .attach(routed.binding, routed.endpoint, statement)
                    .await?
            }
        };

        tracing::debug!(
            session_id = %router.id(),
            kind = %kind,
            endpoint = %attached.endpoint,
            "Executing statement"
        );
        metrics::record_statement(kind, attached.endpoint);
        self.last_kind = Some(kind);
        let outcome = attached.statement.execute(sql).await?;
        self.core.last_outcome = Some(outcome.clone());
        Ok(outcome)
    }
}

/// Statement whose SQL is fixed, and classified, once at prepare time.
pub(crate) struct PreparedStatement {
    core: StatementCore<dyn BackendPreparedStatement>,
    sql: String,
    kind: StatementKind,
    params: Vec<Value>,
}

impl PreparedStatement {
    fn new(sql: &str) -> Result<Self> {
        Ok(Self {
            core: StatementCore::new(),
            kind: classify(sql)?,
            sql: sql.to_string(),
            params: Vec::new(),
        })
    }

    fn set_parameter(&mut self, index: usize, value: Value) -> Result<()> {
        self.core.ensure_open()?;
        if index == 0 {
            return Err(RouterError::ParameterIndex { index });
        }
        if self.params.len() < index {
            self.params.resize(index, Value::Null);
        }
        self.params[index - 1] = value;
        Ok(())
    }

    fn clear_parameters(&mut self) -> Result<()> {
        self.core.ensure_open()?;
        self.params.clear();
        Ok(())
    }

    async fn execute(&mut self, router: &mut SessionRouter) -> Result<ExecuteOutcome> {
        self.core.ensure_open()?;
        let routed = router.connection_for(self.kind.is_read()).await?;

        let attached = match self.core.detach_for(routed.binding).await {
            Some(attached) => self.core.reattach(attached),
            None => {
                let statement = routed.connection.prepare(&self.sql).await?;
                self.core
                    .attach(routed.binding, routed.endpoint, statement)
                    .await?
            }
        };

        tracing::debug!(
            session_id = %router.id(),
            kind = %self.kind,
            endpoint = %attached.endpoint,
            "Executing prepared statement"
        );
        metrics::record_statement(self.kind, attached.endpoint);
        let outcome = attached.statement.execute(&self.params).await?;
        self.core.last_outcome = Some(outcome.clone());
        Ok(outcome)
    }
}

/// A statement tracked by its session.
pub(crate) enum StatementHandle {
    Plain(PlainStatement),
    Prepared(PreparedStatement),
}

impl StatementHandle {
    pub(crate) fn plain() -> Self {
        StatementHandle::Plain(PlainStatement::new())
    }

    pub(crate) fn prepared(sql: &str) -> Result<Self> {
        PreparedStatement::new(sql).map(StatementHandle::Prepared)
    }

    pub(crate) async fn execute(
        &mut self,
        router: &mut SessionRouter,
        sql: &str,
    ) -> Result<ExecuteOutcome> {
        match self {
            StatementHandle::Plain(statement) => statement.execute(router, sql).await,
            StatementHandle::Prepared(_) => Err(RouterError::unsupported(
                "execute with SQL text on a prepared statement",
            )),
        }
    }

    pub(crate) async fn execute_prepared(
        &mut self,
        router: &mut SessionRouter,
    ) -> Result<ExecuteOutcome> {
        match self {
            StatementHandle::Prepared(statement) => statement.execute(router).await,
            StatementHandle::Plain(_) => Err(RouterError::unsupported(
                "execute without SQL text on a plain statement",
            )),
        }
    }

    pub(crate) fn set_parameter(&mut self, index: usize, value: Value) -> Result<()> {
        match self {
            StatementHandle::Prepared(statement) => statement.set_parameter(index, value),
            StatementHandle::Plain(_) => {
                Err(RouterError::unsupported("parameters on a plain statement"))
            }
        }
    }

    pub(crate) fn clear_parameters(&mut self) -> Result<()> {
        match self {
            StatementHandle::Prepared(statement) => statement.clear_parameters(),
            StatementHandle::Plain(_) => {
                Err(RouterError::unsupported("parameters on a plain statement"))
            }
        }
    }

    pub(crate) async fn set_query_timeout(&mut self, timeout: Duration) -> Result<()> {
        match self {
            StatementHandle::Plain(statement) => statement.core.set_query_timeout(timeout).await,
            StatementHandle::Prepared(statement) => statement.core.set_query_timeout(timeout).await,
        }
    }

    pub(crate) async fn set_fetch_size(&mut self, rows: u32) -> Result<()> {
        match self {
            StatementHandle::Plain(statement) => statement.core.set_fetch_size(rows).await,
            StatementHandle::Prepared(statement) => statement.core.set_fetch_size(rows).await,
        }
    }

    pub(crate) async fn set_max_rows(&mut self, rows: u64) -> Result<()> {
        match self {
            StatementHandle::Plain(statement) => statement.core.set_max_rows(rows).await,
            StatementHandle::Prepared(statement) => statement.core.set_max_rows(rows).await,
        }
    }

    pub(crate) fn options(&self) -> StatementOptions {
        match self {
            StatementHandle::Plain(statement) => statement.core.options,
            StatementHandle::Prepared(statement) => statement.core.options,
        }
    }

    /// Kind of the last executed SQL for a plain statement; the fixed kind
    /// for a prepared one.
    pub(crate) fn kind(&self) -> Option<StatementKind> {
        match self {
            StatementHandle::Plain(statement) => statement.last_kind,
            StatementHandle::Prepared(statement) => Some(statement.kind),
        }
    }

    pub(crate) fn endpoint(&self) -> Option<Role> {
        match self {
            StatementHandle::Plain(statement) => statement.core.endpoint(),
            StatementHandle::Prepared(statement) => statement.core.endpoint(),
        }
    }

    pub(crate) fn last_outcome(&self) -> Option<&ExecuteOutcome> {
        match self {
            StatementHandle::Plain(statement) => statement.core.last_outcome.as_ref(),
            StatementHandle::Prepared(statement) => statement.core.last_outcome.as_ref(),
        }
    }

    pub(crate) async fn close(&mut self) -> std::result::Result<(), BackendError> {
        match self {
            StatementHandle::Plain(statement) => statement.core.close().await,
            StatementHandle::Prepared(statement) => statement.core.close().await,
        }
    }
}
