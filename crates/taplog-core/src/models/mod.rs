//! Data models for Tap Logger

mod category;
mod entry;

pub use category::{Category, InitialWritePolicy, NoteTarget};
pub use entry::{EntryId, LogEntry, CHECKMARK};
