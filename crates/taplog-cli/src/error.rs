use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] taplog_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Entry ID cannot be empty")]
    EmptyEntryId,
    #[error("Entry not found for id/prefix: {0}")]
    EntryNotFound(String),
    #[error("{0}")]
    AmbiguousEntryId(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error(
        "Supabase is not configured. Run `taplog config init` or set TAPLOG_SUPABASE_URL and TAPLOG_SUPABASE_ANON_KEY."
    )]
    NotConfigured,
}

impl From<taplog_core::auth::AuthError> for CliError {
    fn from(error: taplog_core::auth::AuthError) -> Self {
        Self::Auth(error.to_string())
    }
}

impl From<taplog_core::store::StoreError> for CliError {
    fn from(error: taplog_core::store::StoreError) -> Self {
        Self::Core(error.into())
    }
}
