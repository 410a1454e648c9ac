//! Log entry model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::category::{Category, NoteTarget};

/// Marker stored in a category field when it was tapped without a note.
pub const CHECKMARK: &str = "✔";

/// A unique identifier for a log entry, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Create a new unique entry ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// One recorded event.
///
/// Field names match the columns of the remote `logs` table so the same
/// representation is used for the wire, the local cache, and the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Stable identity shared by the local and remote copies
    pub id: EntryId,
    /// Creation time (Unix ms), never changed after creation
    pub ts: i64,
    /// Owner of the entry; absent until associated with a session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub eat: Option<String>,
    #[serde(default)]
    pub drink: Option<String>,
    #[serde(default)]
    pub feel: Option<String>,
    #[serde(default)]
    pub posture: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl LogEntry {
    /// Create an empty entry stamped with the given time and owner.
    #[must_use]
    pub fn new(ts: i64, user_id: Option<String>) -> Self {
        Self {
            id: EntryId::new(),
            ts,
            user_id,
            eat: None,
            drink: None,
            feel: None,
            posture: None,
            note: None,
        }
    }

    /// Create an entry with `category` marked as recorded.
    #[must_use]
    pub fn tapped(category: Category, ts: i64, user_id: Option<String>) -> Self {
        let mut entry = Self::new(ts, user_id);
        entry.set_category(category, CHECKMARK);
        entry
    }

    #[must_use]
    pub fn category(&self, category: Category) -> Option<&str> {
        match category {
            Category::Eat => self.eat.as_deref(),
            Category::Drink => self.drink.as_deref(),
            Category::Feel => self.feel.as_deref(),
            Category::Posture => self.posture.as_deref(),
        }
    }

    pub fn set_category(&mut self, category: Category, value: impl Into<String>) {
        let slot = match category {
            Category::Eat => &mut self.eat,
            Category::Drink => &mut self.drink,
            Category::Feel => &mut self.feel,
            Category::Posture => &mut self.posture,
        };
        *slot = Some(value.into());
    }

    /// Fill the slot a pending note was waiting for.
    ///
    /// An empty note never erases a recorded category; the checkmark stays.
    /// The free-note field takes the text verbatim, empty included.
    pub fn apply_note(&mut self, target: NoteTarget, text: &str) {
        match target {
            NoteTarget::Category(category) => {
                let value = if text.is_empty() { CHECKMARK } else { text };
                self.set_category(category, value);
            }
            NoteTarget::FreeNote => self.note = Some(text.to_string()),
        }
    }

    /// Check whether no category and no note is set.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        Category::ALL
            .iter()
            .all(|category| self.category(*category).is_none())
            && self.note.is_none()
    }
}
