//! Shared client state types.

use std::fmt;

use crate::models::EntryId;

/// Outcome of the most recent pull from the remote store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    /// No session, nothing was fetched.
    Offline,
    Syncing,
    /// The in-memory log was replaced with the remote rows.
    Synced,
    /// The fetch failed; the existing log was kept.
    Error,
}

impl SyncState {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Error => "error",
        }
    }
}

/// Non-blocking warning raised by a background remote write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// The initial insert of a tapped entry failed; the local copy is kept.
    CloudSaveFailed(EntryId),
    /// The upsert carrying an attached note failed; the local edit is kept.
    NoteSyncFailed(EntryId),
}

impl Notice {
    #[must_use]
    pub const fn entry_id(&self) -> EntryId {
        match self {
            Self::CloudSaveFailed(id) | Self::NoteSyncFailed(id) => *id,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CloudSaveFailed(_) => f.write_str("Cloud save failed. Tap “sync” later when online."),
            Self::NoteSyncFailed(_) => f.write_str("Sync failed; try again."),
        }
    }
}
