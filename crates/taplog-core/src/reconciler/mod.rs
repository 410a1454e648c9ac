//! Log reconciliation between the in-memory view, the local cache, and the
//! remote table.
//!
//! The in-memory log is the rendered truth. Every mutation is applied locally
//! first and persisted to the local cache; the matching remote write is spawned
//! in the background and never awaited by the caller. Remote failures surface
//! as [`Notice`]s and are never retried. The only way back to the remote
//! state is [`LogReconciler::pull_all`], a full overwrite.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::auth::AuthSession;
use crate::cache::LocalCache;
use crate::error::{Error, Result};
use crate::export::{render_csv_export, suggested_export_file_name, ExportArtifact};
use crate::models::{Category, EntryId, InitialWritePolicy, LogEntry, NoteTarget};
use crate::state::{Notice, SyncState};
use crate::store::RemoteStore;
use crate::timeline::sorted_desc;
use crate::util::unix_timestamp_millis_now;

/// An open note prompt and the entry it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingNote {
    pub entry_id: EntryId,
    pub target: NoteTarget,
}

pub struct LogReconciler {
    entries: Vec<LogEntry>,
    session: Option<AuthSession>,
    pending: Option<PendingNote>,
    last_sync: SyncState,
    remote: Arc<dyn RemoteStore>,
    cache: LocalCache,
    notices_tx: mpsc::UnboundedSender<Notice>,
    notices_rx: mpsc::UnboundedReceiver<Notice>,
    in_flight: JoinSet<()>,
}

impl LogReconciler {
    pub fn new(remote: Arc<dyn RemoteStore>, cache: LocalCache) -> Self {
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();
        Self {
            entries: Vec::new(),
            session: None,
            pending: None,
            last_sync: SyncState::Offline,
            remote,
            cache,
            notices_tx,
            notices_rx,
            in_flight: JoinSet::new(),
        }
    }

    /// Adopt the cached snapshot if the log is still empty.
    ///
    /// Returns whether a snapshot was adopted.
    pub fn restore_cache(&mut self) -> bool {
        if !self.entries.is_empty() {
            return false;
        }
        match self.cache.restore() {
            Some(entries) if !entries.is_empty() => {
                tracing::debug!("Restored {} entries from local cache", entries.len());
                self.entries = entries;
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub const fn session(&self) -> Option<&AuthSession> {
        self.session.as_ref()
    }

    /// The log, newest first.
    #[must_use]
    pub fn entries(&self) -> Vec<&LogEntry> {
        sorted_desc(&self.entries)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &EntryId) -> Option<&LogEntry> {
        self.entries.iter().find(|entry| entry.id == *id)
    }

    #[must_use]
    pub const fn pending_note(&self) -> Option<PendingNote> {
        self.pending
    }

    #[must_use]
    pub const fn sync_state(&self) -> SyncState {
        self.last_sync
    }

    /// Number of remote writes that have been issued but not yet finished.
    #[must_use]
    pub fn in_flight_writes(&self) -> usize {
        self.in_flight.len()
    }

    /// React to a session replacement.
    ///
    /// A session appearing (or switching user) triggers one full pull; a
    /// session disappearing clears the log. A refreshed session for the same
    /// user only swaps credentials.
    pub async fn apply_session(&mut self, session: Option<AuthSession>) -> SyncState {
        let previous_user = self.session.as_ref().map(|s| s.user_id().to_string());
        let next_user = session.as_ref().map(|s| s.user_id().to_string());
        self.session = session;

        if previous_user == next_user {
            return self.last_sync;
        }

        match next_user {
            None => {
                tracing::info!("Session ended; clearing log");
                self.entries.clear();
                self.pending = None;
                self.last_sync = SyncState::Offline;
                self.commit();
                SyncState::Offline
            }
            Some(user_id) => {
                tracing::info!("Session started for user {}; pulling log", user_id);
                if previous_user.is_some() {
                    self.entries.clear();
                    self.pending = None;
                    self.commit();
                }
                self.pull_all().await
            }
        }
    }

    /// Record a tap on `category`: inserted locally at once and remotely in
    /// the background, then a note prompt for that category opens.
    pub fn record_tap(&mut self, category: Category) -> Result<EntryId> {
        self.record(NoteTarget::Category(category))
    }

    /// Start a free-standing note. The entry stays local until a note is attached.
    pub fn record_free_note(&mut self) -> Result<EntryId> {
        self.record(NoteTarget::FreeNote)
    }

    fn record(&mut self, target: NoteTarget) -> Result<EntryId> {
        let session = self.session.clone().ok_or(Error::SignInRequired)?;
        let owner = Some(session.user_id().to_string());
        let ts = unix_timestamp_millis_now();
        let entry = match target {
            NoteTarget::Category(category) => LogEntry::tapped(category, ts, owner),
            NoteTarget::FreeNote => LogEntry::new(ts, owner),
        };
        let id = entry.id;

        self.entries.insert(0, entry.clone());
        self.pending = Some(PendingNote {
            entry_id: id,
            target,
        });
        self.commit();

        match target.initial_write() {
            InitialWritePolicy::Immediate => self.spawn_insert(session, entry),
            InitialWritePolicy::DeferredUntilNote => {
                tracing::debug!("Deferring remote write of {} until its note", id);
            }
        }
        Ok(id)
    }

    /// Complete the open note prompt with `text`.
    ///
    /// Returns the updated entry id, or `None` when no prompt was open or its
    /// entry is gone (deleted or replaced by a pull).
    pub fn attach_note(&mut self, text: &str) -> Result<Option<EntryId>> {
        let session = self.session.clone().ok_or(Error::SignInRequired)?;
        let Some(pending) = self.pending.take() else {
            return Ok(None);
        };
        let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == pending.entry_id)
        else {
            tracing::debug!("Note target {} no longer in log", pending.entry_id);
            return Ok(None);
        };

        entry.apply_note(pending.target, text.trim());
        let updated = entry.clone();
        self.commit();
        self.spawn_upsert(session, updated);
        Ok(Some(pending.entry_id))
    }

    /// Close the note prompt without touching the entry.
    pub fn cancel_note(&mut self) -> Option<PendingNote> {
        self.pending.take()
    }

    /// Remove an entry locally, and remotely when signed in.
    ///
    /// Returns whether the entry was present locally.
    pub fn delete_entry(&mut self, id: &EntryId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != *id);
        let removed = self.entries.len() != before;

        if removed {
            if self.pending.is_some_and(|pending| pending.entry_id == *id) {
                self.pending = None;
            }
            self.commit();
        }
        if let Some(session) = self.session.clone() {
            self.spawn_delete(session, *id);
        }
        removed
    }

    /// Replace the whole log with the remote rows.
    ///
    /// Local entries missing remotely are dropped. On a failed fetch the
    /// current log is kept and [`SyncState::Error`] is returned.
    pub async fn pull_all(&mut self) -> SyncState {
        let Some(session) = self.session.clone() else {
            self.last_sync = SyncState::Offline;
            return SyncState::Offline;
        };

        self.last_sync = SyncState::Syncing;
        self.last_sync = match self.remote.select_all(&session).await {
            Ok(rows) => {
                tracing::info!("Pulled {} entries", rows.len());
                self.entries = rows;
                self.commit();
                SyncState::Synced
            }
            Err(error) => {
                tracing::warn!("Pull failed, keeping local log: {}", error);
                SyncState::Error
            }
        };
        self.last_sync
    }

    /// Render the log as CSV, fetching the freshest remote rows when signed in.
    ///
    /// The fetch does not replace the in-memory log; a failed fetch falls back
    /// to it.
    pub async fn export_snapshot<Tz>(&self, tz: &Tz, now: DateTime<Utc>) -> Result<ExportArtifact>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let fetched = match &self.session {
            Some(session) => match self.remote.select_all(session).await {
                Ok(rows) => Some(rows),
                Err(error) => {
                    tracing::warn!("Export fetch failed, using local log: {}", error);
                    None
                }
            },
            None => None,
        };

        let contents = match &fetched {
            Some(rows) => render_csv_export(&sorted_desc(rows), tz)?,
            None => render_csv_export(&self.entries(), tz)?,
        };
        Ok(ExportArtifact {
            file_name: suggested_export_file_name(now),
            contents,
        })
    }

    /// Wait for every issued remote write to finish.
    pub async fn settle(&mut self) {
        while let Some(result) = self.in_flight.join_next().await {
            if let Err(error) = result {
                tracing::warn!("Remote write task failed: {}", error);
            }
        }
    }

    /// Collect finished remote writes without waiting for the rest.
    pub fn reap(&mut self) {
        while let Some(result) = self.in_flight.try_join_next() {
            if let Err(error) = result {
                tracing::warn!("Remote write task failed: {}", error);
            }
        }
    }

    /// Take the warnings raised by background writes so far.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(notice) = self.notices_rx.try_recv() {
            notices.push(notice);
        }
        notices
    }

    fn commit(&self) {
        self.cache.persist(&self.entries);
    }

    fn spawn_insert(&mut self, session: AuthSession, entry: LogEntry) {
        let remote = Arc::clone(&self.remote);
        let notices = self.notices_tx.clone();
        self.in_flight.spawn(async move {
            if let Err(error) = remote.insert(&session, &entry).await {
                tracing::warn!("Cloud save failed for {}: {}", entry.id, error);
                let _ = notices.send(Notice::CloudSaveFailed(entry.id));
            }
        });
    }

    fn spawn_upsert(&mut self, session: AuthSession, entry: LogEntry) {
        let remote = Arc::clone(&self.remote);
        let notices = self.notices_tx.clone();
        self.in_flight.spawn(async move {
            if let Err(error) = remote.upsert(&session, &entry).await {
                tracing::warn!("Note sync failed for {}: {}", entry.id, error);
                let _ = notices.send(Notice::NoteSyncFailed(entry.id));
            }
        });
    }

    fn spawn_delete(&mut self, session: AuthSession, id: EntryId) {
        let remote = Arc::clone(&self.remote);
        self.in_flight.spawn(async move {
            if let Err(error) = remote.delete(&session, &id).await {
                tracing::warn!("Remote delete failed for {}: {}", id, error);
            }
        });
    }
}
