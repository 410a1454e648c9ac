//! CSV export of the log.

use chrono::{DateTime, TimeZone, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::error::{Error, Result};
use crate::models::LogEntry;
use crate::timeline::{format_date, format_time};

/// Column layout of every export.
pub const CSV_HEADERS: [&str; 7] = ["time", "date", "eat", "drink", "feel", "posture", "note"];

/// A rendered export ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub contents: String,
}

/// One CSV row for an entry. Unset fields become empty strings and line
/// breaks inside the note are collapsed to spaces.
pub fn entry_to_csv_record<Tz>(entry: &LogEntry, tz: &Tz) -> [String; 7]
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let field = |value: &Option<String>| value.clone().unwrap_or_default();
    [
        format_time(entry.ts, tz),
        format_date(entry.ts, tz),
        field(&entry.eat),
        field(&entry.drink),
        field(&entry.feel),
        field(&entry.posture),
        entry
            .note
            .as_deref()
            .unwrap_or_default()
            .replace("\r\n", " ")
            .replace(['\n', '\r'], " "),
    ]
}

/// Render entries (already in display order) as CSV with every field quoted.
pub fn render_csv_export<Tz>(entries: &[&LogEntry], tz: &Tz) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS)?;
    for entry in entries {
        writer.write_record(entry_to_csv_record(entry, tz))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::Io(error.into_error()))?;
    let mut contents =
        String::from_utf8(bytes).map_err(|error| Error::InvalidInput(error.to_string()))?;
    if contents.ends_with('\n') {
        contents.pop();
    }
    Ok(contents)
}

/// Build the default export file name from the current UTC date.
#[must_use]
pub fn suggested_export_file_name(now: DateTime<Utc>) -> String {
    format!("taplog-{}.csv", now.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{Category, LogEntry};

    // 2025-10-18T09:05:00Z
    const SAT_MORNING: i64 = 1_760_778_300_000;

    #[test]
    fn header_only_for_empty_log() {
        let rendered = render_csv_export(&[], &Utc).unwrap();
        assert_eq!(
            rendered,
            r#""time","date","eat","drink","feel","posture","note""#
        );
    }

    #[test]
    fn note_quotes_are_doubled_and_newlines_collapsed() {
        let mut entry = LogEntry::new(SAT_MORNING, None);
        entry.note = Some("said \"hi\"\nthen left".to_string());

        let rendered = render_csv_export(&[&entry], &Utc).unwrap();
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            r#""9:05 AM","Sat, Oct 18","","","","","said ""hi"" then left""#
        );
    }

    #[test]
    fn category_markers_are_exported() {
        let mut entry = LogEntry::tapped(Category::Eat, SAT_MORNING, None);
        entry.posture = Some("slouching, badly".to_string());

        let record = entry_to_csv_record(&entry, &Utc);
        assert_eq!(record[2], "✔");
        assert_eq!(record[5], "slouching, badly");

        let rendered = render_csv_export(&[&entry], &Utc).unwrap();
        assert!(rendered.contains(r#""✔","","","slouching, badly","""#));
    }

    #[test]
    fn suggested_file_name_uses_iso_date() {
        let now = DateTime::from_timestamp_millis(SAT_MORNING).unwrap();
        assert_eq!(suggested_export_file_name(now), "taplog-2025-10-18.csv");
    }
}
