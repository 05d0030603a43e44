//! Error types for the router.
//!
//! # Propagation
//! - Classification and closed-state errors surface at the point of violation
//! - Backend errors pass through unchanged from the collaborator
//! - Health probe failures never become a `RouterError`; they only flip
//!   availability flags

use thiserror::Error;

use crate::config::loader::ConfigError;

/// Result type for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;

/// Error raised by a backend collaborator (factory, connection or statement).
///
/// Opaque on purpose: drivers wrap their own error as the source.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct BackendError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BackendError {
    /// Create a backend error with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a driver error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Main error type.
#[derive(Error, Debug)]
pub enum RouterError {
    /// Statement does not start with a recognized keyword.
    #[error("unsupported statement, only select, show, load, insert, update, delete, replace, truncate, create, drop and alter are routed: {statement}")]
    Classification { statement: String },

    /// Operation on a closed session or statement.
    #[error("no operations allowed after {resource} closed")]
    Closed { resource: &'static str },

    /// Operation outside the routed surface.
    #[error("unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// Prepared statement parameters are numbered from 1.
    #[error("parameter index out of range: {index}")]
    ParameterIndex { index: usize },

    /// Error propagated from a backend.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Construction or configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RouterError {
    pub(crate) fn closed(resource: &'static str) -> Self {
        RouterError::Closed { resource }
    }

    pub(crate) fn unsupported(operation: impl Into<String>) -> Self {
        RouterError::Unsupported {
            operation: operation.into(),
        }
    }

    /// True for errors that came from a backend.
    pub fn is_backend(&self) -> bool {
        matches!(self, RouterError::Backend(_))
    }
}
