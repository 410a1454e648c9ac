//! Single-key shortcuts for the interactive surface.

use crate::models::Category;

/// Action bound to a key press while no note prompt has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Record(Category),
    FreeNote,
    Sync,
    Export,
    Quit,
}

impl Shortcut {
    /// Resolve a key press (case-insensitive).
    #[must_use]
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'e' => Some(Self::Record(Category::Eat)),
            'd' => Some(Self::Record(Category::Drink)),
            'f' => Some(Self::Record(Category::Feel)),
            'p' => Some(Self::Record(Category::Posture)),
            'n' => Some(Self::FreeNote),
            's' => Some(Self::Sync),
            'x' => Some(Self::Export),
            'q' => Some(Self::Quit),
            _ => None,
        }
    }

    /// Resolve a line of input consisting of exactly one key.
    #[must_use]
    pub fn from_line(line: &str) -> Option<Self> {
        let mut chars = line.trim().chars();
        let key = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        Self::from_key(key)
    }
}

/// Help line listing every shortcut.
#[must_use]
pub fn shortcut_help() -> String {
    let categories = Category::ALL
        .iter()
        .map(|category| format!("{}={}", category.shortcut(), category.key()))
        .collect::<Vec<_>>()
        .join(" ");
    format!("{categories} n=note s=sync x=export q=quit")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_keys_map_to_records() {
        assert_eq!(
            Shortcut::from_key('e'),
            Some(Shortcut::Record(Category::Eat))
        );
        assert_eq!(
            Shortcut::from_key('D'),
            Some(Shortcut::Record(Category::Drink))
        );
        assert_eq!(
            Shortcut::from_key('f'),
            Some(Shortcut::Record(Category::Feel))
        );
        assert_eq!(
            Shortcut::from_key('p'),
            Some(Shortcut::Record(Category::Posture))
        );
        assert_eq!(Shortcut::from_key('n'), Some(Shortcut::FreeNote));
        assert_eq!(Shortcut::from_key('z'), None);
    }

    #[test]
    fn from_line_requires_single_key() {
        assert_eq!(Shortcut::from_line(" e \n"), Some(Shortcut::Record(Category::Eat)));
        assert_eq!(Shortcut::from_line("eat"), None);
        assert_eq!(Shortcut::from_line(""), None);
    }

    #[test]
    fn help_lists_category_keys() {
        let help = shortcut_help();
        assert!(help.starts_with("e=eat d=drink f=feel p=posture"));
    }
}
