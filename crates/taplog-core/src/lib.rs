//! taplog-core - Core library for Tap Logger
//!
//! Models, Supabase auth and storage, the local cache, and the log
//! reconciler shared by every Tap Logger surface.

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod keymap;
pub mod models;
pub mod reconciler;
pub mod session;
pub mod state;
pub mod store;
pub mod timeline;
pub mod util;

pub use error::{Error, Result};
pub use models::{Category, EntryId, LogEntry, NoteTarget};
pub use reconciler::{LogReconciler, PendingNote};
pub use session::SessionGate;
pub use state::{Notice, SyncState};
