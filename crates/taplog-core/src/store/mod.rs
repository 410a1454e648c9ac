//! Remote table storage for log entries.

mod supabase;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::AuthSession;
use crate::models::{EntryId, LogEntry};

pub use supabase::{normalize_rest_url, SupabaseLogStore, LOGS_TABLE};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid store configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Store API error: {0}")]
    Api(String),
    #[error("Row conflict: {0}")]
    Conflict(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Minimal CRUD surface over the remote `logs` table.
///
/// Every call is authorized by the caller's session; rows are scoped to
/// `session.user.id`.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All rows of the session owner, newest first.
    async fn select_all(&self, session: &AuthSession) -> StoreResult<Vec<LogEntry>>;

    async fn insert(&self, session: &AuthSession, entry: &LogEntry) -> StoreResult<()>;

    /// Insert or replace the row with the same id.
    async fn upsert(&self, session: &AuthSession, entry: &LogEntry) -> StoreResult<()>;

    async fn delete(&self, session: &AuthSession, id: &EntryId) -> StoreResult<()>;
}
