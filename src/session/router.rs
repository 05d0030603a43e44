//! Per-session connection routing.
//!
//! # Responsibilities
//! - Lazily bind at most one read and one write connection
//! - Once a write connection is bound, route everything to it
//! - Record session settings and apply them to the write connection only
//!
//! # Design Decisions
//! - Read connections are never mutated (no autocommit, isolation or
//!   catalog changes)
//! - Settings recorded before a write connection exists are applied when it
//!   is bound (normalization), and only where they differ from a fresh
//!   connection's defaults

use std::sync::Arc;

use uuid::Uuid;

use crate::backend::{
    BackendConnection, BackendPair, BackendResult, Credentials, IsolationLevel, Role,
};
use crate::error::{BackendError, Result};

/// Which of the session's two connections a statement runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    Read,
    Write,
}

/// A connection chosen for one call.
pub struct Routed<'a> {
    pub binding: Binding,
    /// Endpoint the connection was opened against.
    pub endpoint: Role,
    pub connection: &'a dyn BackendConnection,
}

/// Session-level settings as the caller last set them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub auto_commit: bool,
    pub isolation: Option<IsolationLevel>,
    pub catalog: Option<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            auto_commit: true,
            isolation: None,
            catalog: None,
        }
    }
}

impl SessionSettings {
    /// Apply the settings that differ from a fresh connection's defaults.
    async fn normalize(&self, connection: &dyn BackendConnection) -> BackendResult<()> {
        if !self.auto_commit {
            connection.set_auto_commit(false).await?;
        }
        if let Some(level) = self.isolation {
            connection.set_transaction_isolation(level).await?;
        }
        if let Some(catalog) = &self.catalog {
            connection.set_catalog(catalog).await?;
        }
        Ok(())
    }
}

struct BoundConnection {
    endpoint: Role,
    connection: Box<dyn BackendConnection>,
}

/// Routes one session's statements onto its backend connections.
pub struct SessionRouter {
    id: Uuid,
    pair: Arc<BackendPair>,
    credentials: Option<Credentials>,
    read: Option<BoundConnection>,
    write: Option<BoundConnection>,
    settings: SessionSettings,
}

impl SessionRouter {
    pub fn new(pair: Arc<BackendPair>, credentials: Option<Credentials>) -> Self {
        Self {
            id: Uuid::new_v4(),
            pair,
            credentials,
            read: None,
            write: None,
            settings: SessionSettings::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn has_write_connection(&self) -> bool {
        self.write.is_some()
    }

    /// Endpoint behind the bound read connection, if any.
    pub fn read_endpoint(&self) -> Option<Role> {
        self.read.as_ref().map(|bound| bound.endpoint)
    }

    /// Endpoint behind the bound write connection, if any.
    pub fn write_endpoint(&self) -> Option<Role> {
        self.write.as_ref().map(|bound| bound.endpoint)
    }

    /// Resolve the connection for a read or a write, binding one if needed.
    ///
    /// A bound write connection wins regardless of `is_read`.
    pub async fn connection_for(&mut self, is_read: bool) -> Result<Routed<'_>> {
        let binding = if is_read && self.write.is_none() {
            Binding::Read
        } else {
            Binding::Write
        };

        let slot = match binding {
            Binding::Read => &mut self.read,
            Binding::Write => &mut self.write,
        };

        let bound = match slot.take() {
            Some(bound) => slot.insert(bound),
            None => {
                let (endpoint, connection) = match binding {
                    Binding::Read => self.pair.open_read(self.credentials.as_ref()).await?,
                    Binding::Write => self.pair.open_write(self.credentials.as_ref()).await?,
                };
                tracing::debug!(
                    session_id = %self.id,
                    binding = ?binding,
                    endpoint = %endpoint,
                    "Bound backend connection"
                );
                let bound = slot.insert(BoundConnection {
                    endpoint,
                    connection,
                });
                if binding == Binding::Write {
                    self.settings.normalize(bound.connection.as_ref()).await?;
                }
                bound
            }
        };

        Ok(Routed {
            binding,
            endpoint: bound.endpoint,
            connection: bound.connection.as_ref(),
        })
    }

    pub async fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()> {
        if self.settings.auto_commit == auto_commit {
            return Ok(());
        }
        self.settings.auto_commit = auto_commit;
        if let Some(write) = &self.write {
            write.connection.set_auto_commit(auto_commit).await?;
        }
        Ok(())
    }

    pub async fn set_transaction_isolation(&mut self, level: IsolationLevel) -> Result<()> {
        if self.settings.isolation == Some(level) {
            return Ok(());
        }
        self.settings.isolation = Some(level);
        if let Some(write) = &self.write {
            write.connection.set_transaction_isolation(level).await?;
        }
        Ok(())
    }

    pub async fn set_catalog(&mut self, catalog: &str) -> Result<()> {
        if self.settings.catalog.as_deref() == Some(catalog) {
            return Ok(());
        }
        self.settings.catalog = Some(catalog.to_string());
        if let Some(write) = &self.write {
            write.connection.set_catalog(catalog).await?;
        }
        Ok(())
    }

    /// Commit on the write connection. Nothing to do in autocommit mode or
    /// when the session has only read.
    pub async fn commit(&mut self) -> Result<()> {
        if self.settings.auto_commit {
            return Ok(());
        }
        if let Some(write) = &self.write {
            if let Err(e) = write.connection.commit().await {
                tracing::error!(session_id = %self.id, error = %e, "Commit failed on write connection");
                return Err(e.into());
            }
        }
        Ok(())
    }

    pub async fn rollback(&mut self) -> Result<()> {
        if self.settings.auto_commit {
            return Ok(());
        }
        if let Some(write) = &self.write {
            if let Err(e) = write.connection.rollback().await {
                tracing::error!(session_id = %self.id, error = %e, "Rollback failed on write connection");
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// Connection for metadata: the read connection, else the write
    /// connection, else a newly bound read connection.
    pub async fn metadata_connection(&mut self) -> Result<&dyn BackendConnection> {
        if self.read.is_none() && self.write.is_none() {
            self.connection_for(true).await?;
        }
        match (&self.read, &self.write) {
            (Some(bound), _) | (None, Some(bound)) => Ok(bound.connection.as_ref()),
            (None, None) => Err(BackendError::new("no backend connection bound").into()),
        }
    }

    pub async fn warnings(&self) -> Result<Vec<String>> {
        match (&self.read, &self.write) {
            (Some(bound), _) | (None, Some(bound)) => Ok(bound.connection.warnings().await?),
            (None, None) => Ok(Vec::new()),
        }
    }

    pub async fn clear_warnings(&self) -> Result<()> {
        for bound in self.read.iter().chain(self.write.iter()) {
            bound.connection.clear_warnings().await?;
        }
        Ok(())
    }

    /// Close both connections, write first. Every close is attempted; the
    /// last failure is returned.
    pub async fn close_connections(&mut self) -> Option<BackendError> {
        let mut last = None;
        for bound in [self.write.take(), self.read.take()].into_iter().flatten() {
            if let Err(e) = bound.connection.close().await {
                tracing::warn!(
                    session_id = %self.id,
                    endpoint = %bound.endpoint,
                    error = %e,
                    "Failed to close backend connection"
                );
                last = Some(e);
            }
        }
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::NamedFactory;
    use crate::backend::ConnectionFactory;

    fn router(with_slave: bool) -> (SessionRouter, Arc<NamedFactory>, Arc<NamedFactory>) {
        let master = NamedFactory::arc("master");
        let slave = NamedFactory::arc("slave");
        let pair = BackendPair::new(
            master.clone(),
            with_slave.then(|| slave.clone() as Arc<dyn ConnectionFactory>),
            false,
        );
        (SessionRouter::new(Arc::new(pair), None), master, slave)
    }

    #[tokio::test]
    async fn test_reads_then_write_sticks_to_write() {
        let (mut router, master, slave) = router(true);

        let routed = router.connection_for(true).await.unwrap();
        assert_eq!((routed.binding, routed.endpoint), (Binding::Read, Role::Slave));

        let routed = router.connection_for(false).await.unwrap();
        assert_eq!((routed.binding, routed.endpoint), (Binding::Write, Role::Master));

        let routed = router.connection_for(true).await.unwrap();
        assert_eq!((routed.binding, routed.endpoint), (Binding::Write, Role::Master));

        assert_eq!(slave.attempts(), 1);
        assert_eq!(master.attempts(), 1);
    }

    #[tokio::test]
    async fn test_read_connection_is_reused() {
        let (mut router, _, slave) = router(true);
        router.connection_for(true).await.unwrap();
        router.connection_for(true).await.unwrap();
        assert_eq!(slave.attempts(), 1);
        assert_eq!(router.read_endpoint(), Some(Role::Slave));
        assert!(!router.has_write_connection());
    }

    #[tokio::test]
    async fn test_failed_bind_leaves_slot_empty() {
        let (mut router, master, _) = router(false);
        master.fail_next(1);
        assert!(router.connection_for(false).await.is_err());
        assert!(!router.has_write_connection());

        router.connection_for(false).await.unwrap();
        assert_eq!(router.write_endpoint(), Some(Role::Master));
    }

    #[tokio::test]
    async fn test_commit_in_autocommit_is_noop() {
        let (mut router, master, _) = router(false);
        router.commit().await.unwrap();
        router.rollback().await.unwrap();
        assert_eq!(master.attempts(), 0);
    }

    #[tokio::test]
    async fn test_metadata_binds_read_connection() {
        let (mut router, _, slave) = router(true);
        let metadata = router.metadata_connection().await.unwrap().metadata().await.unwrap();
        assert_eq!(metadata.product_name, "slave");
        assert_eq!(slave.attempts(), 1);
    }

    #[tokio::test]
    async fn test_close_connections_closes_both() {
        let (mut router, master, slave) = router(true);
        router.connection_for(true).await.unwrap();
        router.connection_for(false).await.unwrap();

        assert!(router.close_connections().await.is_none());
        assert_eq!(master.closes() + slave.closes(), 2);
        assert!(router.read_endpoint().is_none());
        assert!(router.write_endpoint().is_none());
    }
}
