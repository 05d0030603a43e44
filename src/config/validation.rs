//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (attempts, worker count, period)
//! - Check the detect statement routes as a read
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use crate::config::schema::RouterConfig;
use crate::sql;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every problem.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let health = &config.health_check;

    if health.recheck_times == 0 {
        errors.push(ValidationError::new(
            "health_check.recheck_times",
            "must be at least 1",
        ));
    }
    if health.thread_count == 0 {
        errors.push(ValidationError::new(
            "health_check.thread_count",
            "must be at least 1",
        ));
    }
    if health.monitor_period_ms == 0 {
        errors.push(ValidationError::new(
            "health_check.monitor_period_ms",
            "must be greater than 0",
        ));
    }
    if health.detect_statement.trim().is_empty() {
        errors.push(ValidationError::new(
            "health_check.detect_statement",
            "must not be empty",
        ));
    } else {
        match sql::classify(&health.detect_statement) {
            Ok(kind) if kind.is_read() => {}
            Ok(kind) => errors.push(ValidationError::new(
                "health_check.detect_statement",
                format!("must be a read statement, got {}", kind),
            )),
            Err(e) => errors.push(ValidationError::new(
                "health_check.detect_statement",
                e.to_string(),
            )),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
