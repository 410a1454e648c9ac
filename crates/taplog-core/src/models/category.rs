//! Tap categories and note targets

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four tappable columns of the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Eat,
    Drink,
    Feel,
    Posture,
}

impl Category {
    /// Categories in column order.
    pub const ALL: [Self; 4] = [Self::Eat, Self::Drink, Self::Feel, Self::Posture];

    /// Column key, also used as the display label.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Eat => "eat",
            Self::Drink => "drink",
            Self::Feel => "feel",
            Self::Posture => "posture",
        }
    }

    /// Keyboard shortcut (first letter of the key).
    #[must_use]
    pub const fn shortcut(self) -> char {
        match self {
            Self::Eat => 'e',
            Self::Drink => 'd',
            Self::Feel => 'f',
            Self::Posture => 'p',
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.key() == normalized)
            .ok_or_else(|| format!("unknown category '{}'", s.trim()))
    }
}

/// The field an awaited note will be written into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteTarget {
    Category(Category),
    FreeNote,
}

impl NoteTarget {
    /// When the entry that opened this note prompt is first written remotely.
    #[must_use]
    pub const fn initial_write(self) -> InitialWritePolicy {
        match self {
            Self::Category(_) => InitialWritePolicy::Immediate,
            Self::FreeNote => InitialWritePolicy::DeferredUntilNote,
        }
    }
}

/// Remote write timing for a freshly created entry.
///
/// Category taps are inserted remotely as soon as they are recorded. Free
/// notes are only sent once the note text is attached, so a cancelled free
/// note exists locally only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialWritePolicy {
    Immediate,
    DeferredUntilNote,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("EAT".parse::<Category>().unwrap(), Category::Eat);
        assert_eq!(" posture ".parse::<Category>().unwrap(), Category::Posture);
        assert!("sleep".parse::<Category>().is_err());
    }

    #[test]
    fn shortcuts_are_first_letters() {
        for category in Category::ALL {
            assert!(category.key().starts_with(category.shortcut()));
        }
    }

    #[test]
    fn write_policy_is_asymmetric() {
        assert_eq!(
            NoteTarget::Category(Category::Feel).initial_write(),
            InitialWritePolicy::Immediate
        );
        assert_eq!(
            NoteTarget::FreeNote.initial_write(),
            InitialWritePolicy::DeferredUntilNote
        );
    }
}
