//! Base domain error model shared by the value types in this crate.

use thiserror::Error;

/// Domain-level error for primitive parsing and validation.
///
/// Business rejections with richer context (stock shortfalls, lifecycle
/// violations) live in the crates that own those rules.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A role name did not match any known role.
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
