//! Master/slave backend pair.
//!
//! # Responsibilities
//! - Own exactly one master and at most one slave endpoint
//! - Resolve the factory for reads and for writes from current availability
//! - Receive availability reports from the health monitor
//!
//! # Resolution
//! ```text
//! read:  slave present and available           → slave, else master
//! write: master down, slave writable and up    → slave, else master
//! ```
//! Write resolution returns the master even when it is known to be down;
//! the caller then sees an ordinary connection failure.

use std::sync::Arc;

use crate::backend::connection::{BackendConnection, BackendResult, ConnectionFactory};
use crate::backend::endpoint::{BackendEndpoint, Role};
use crate::backend::types::Credentials;
use crate::health::AvailabilitySink;
use crate::observability::metrics;

/// The two endpoints a router splits traffic across.
#[derive(Debug)]
pub struct BackendPair {
    master: BackendEndpoint,
    slave: Option<BackendEndpoint>,
}

impl BackendPair {
    /// Create a pair. A missing slave means all reads go to the master.
    pub fn new(
        master: Arc<dyn ConnectionFactory>,
        slave: Option<Arc<dyn ConnectionFactory>>,
        slave_writable: bool,
    ) -> Self {
        Self {
            master: BackendEndpoint::new(Role::Master, master, true),
            slave: slave.map(|factory| BackendEndpoint::new(Role::Slave, factory, slave_writable)),
        }
    }

    pub fn master(&self) -> &BackendEndpoint {
        &self.master
    }

    pub fn slave(&self) -> Option<&BackendEndpoint> {
        self.slave.as_ref()
    }

    pub fn endpoint(&self, role: Role) -> Option<&BackendEndpoint> {
        match role {
            Role::Master => Some(&self.master),
            Role::Slave => self.slave.as_ref(),
        }
    }

    /// All endpoints, master first.
    pub fn endpoints(&self) -> impl Iterator<Item = &BackendEndpoint> {
        std::iter::once(&self.master).chain(self.slave.iter())
    }

    /// Endpoint to use for a read.
    pub fn resolve_read(&self) -> &BackendEndpoint {
        match &self.slave {
            Some(slave) if slave.is_available() => slave,
            _ => &self.master,
        }
    }

    /// Endpoint to use for a write.
    pub fn resolve_write(&self) -> &BackendEndpoint {
        match &self.slave {
            Some(slave)
                if !self.master.is_available() && slave.is_writable() && slave.is_available() =>
            {
                slave
            }
            _ => &self.master,
        }
    }

    /// Open a connection for reads.
    pub async fn open_read(
        &self,
        credentials: Option<&Credentials>,
    ) -> BackendResult<(Role, Box<dyn BackendConnection>)> {
        open(self.resolve_read(), credentials).await
    }

    /// Open a connection for writes.
    pub async fn open_write(
        &self,
        credentials: Option<&Credentials>,
    ) -> BackendResult<(Role, Box<dyn BackendConnection>)> {
        open(self.resolve_write(), credentials).await
    }
}

// Blank credentials fall back to the factory's own.
async fn open(
    endpoint: &BackendEndpoint,
    credentials: Option<&Credentials>,
) -> BackendResult<(Role, Box<dyn BackendConnection>)> {
    let connection = match credentials.filter(|c| !c.is_blank()) {
        Some(credentials) => endpoint.factory().connect_with(credentials).await?,
        None => endpoint.factory().connect().await?,
    };
    metrics::record_connection_opened(endpoint.role());
    Ok((endpoint.role(), connection))
}

impl AvailabilitySink for BackendPair {
    fn on_available(&self, role: Role) {
        if let Some(endpoint) = self.endpoint(role) {
            endpoint.set_available(true);
        }
    }

    fn on_unavailable(&self, role: Role) {
        if let Some(endpoint) = self.endpoint(role) {
            endpoint.set_available(false);
        }
    }
}
