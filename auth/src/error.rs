//! Error types for identity parsing.

use thiserror::Error;

/// Result type alias for identity operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Failures turning configuration or wire values into identities.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Role name not recognised.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// User id is not a non-negative integer.
    #[error("Invalid user id: {0}")]
    InvalidUserId(String),
}
