//! Statement classification.
//!
//! # Data Flow
//! ```text
//! raw SQL
//!     → strip.rs (drop comments and literal contents)
//!     → kind.rs (match leading keyword, refine SELECT ... FOR UPDATE)
//!     → StatementKind::is_read() decides read vs write backend
//! ```
//!
//! # Design Decisions
//! - Not a parser: only the leading keyword matters
//! - Unknown leading keywords are rejected, never guessed

pub mod kind;
pub mod strip;

pub use kind::{classify, StatementKind};
pub use strip::strip_comments;
