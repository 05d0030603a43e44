//! Backend endpoint abstraction.
//!
//! # Responsibilities
//! - Represent one backend (master or slave) and its connection factory
//! - Track availability as reported by the health monitor
//! - Carry the write policy of the endpoint

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::backend::connection::ConnectionFactory;
use crate::observability::metrics;

/// Logical role of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Master,
    Slave,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Master => "master",
            Role::Slave => "slave",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single backend endpoint.
#[derive(Debug)]
pub struct BackendEndpoint {
    role: Role,
    factory: Arc<dyn ConnectionFactory>,
    /// Written by the health monitor, read on every routing decision.
    available: AtomicBool,
    writable: bool,
}

impl BackendEndpoint {
    /// Create an endpoint. Endpoints start available.
    pub fn new(role: Role, factory: Arc<dyn ConnectionFactory>, writable: bool) -> Self {
        Self {
            role,
            factory,
            available: AtomicBool::new(true),
            writable,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn factory(&self) -> &Arc<dyn ConnectionFactory> {
        &self.factory
    }

    /// Whether the endpoint may accept writes.
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    /// Record the latest availability. Returns true if the flag flipped.
    pub fn set_available(&self, available: bool) -> bool {
        let previous = self.available.swap(available, Ordering::AcqRel);
        metrics::record_backend_available(self.role, available);
        if previous != available {
            if available {
                tracing::info!(endpoint = %self.role, "Backend became available");
            } else {
                tracing::warn!(endpoint = %self.role, "Backend marked unavailable");
            }
        }
        previous != available
    }
}
