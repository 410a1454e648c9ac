//! Error types for taplog-core

use thiserror::Error;

use crate::auth::AuthError;
use crate::store::StoreError;

/// Result type alias using taplog-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in taplog-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// A remote-mutating action was attempted without an active session
    #[error("Please sign in first (email magic link).")]
    SignInRequired,

    /// Identity provider error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Remote table store error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV rendering error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
