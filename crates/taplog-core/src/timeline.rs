//! Presentation ordering: newest-first view and per-day grouping.

use chrono::{DateTime, NaiveDate, TimeZone};

use crate::models::LogEntry;

/// Entries ordered by timestamp, newest first.
///
/// The sort is stable, so entries sharing a timestamp keep their relative
/// (most recently inserted first) order.
pub fn sorted_desc(entries: &[LogEntry]) -> Vec<&LogEntry> {
    let mut sorted = entries.iter().collect::<Vec<_>>();
    sorted.sort_by(|left, right| right.ts.cmp(&left.ts));
    sorted
}

const UNKNOWN_DAY_LABEL: &str = "Unknown date";

/// A run of consecutive entries recorded on the same calendar day.
///
/// `day` is `None` for timestamps chrono cannot represent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayGroup<'a> {
    pub day: Option<NaiveDate>,
    pub label: String,
    pub entries: Vec<&'a LogEntry>,
}

/// Split a newest-first view into day sections in `tz`.
pub fn group_by_day<'a, Tz>(sorted: &[&'a LogEntry], tz: &Tz) -> Vec<DayGroup<'a>>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut groups: Vec<DayGroup<'a>> = Vec::new();
    for &entry in sorted {
        let day = local_time(entry.ts, tz).map(|local| local.date_naive());
        if let Some(group) = groups.last_mut().filter(|group| group.day == day) {
            group.entries.push(entry);
            continue;
        }
        let label = match day {
            Some(_) => format_date(entry.ts, tz),
            None => UNKNOWN_DAY_LABEL.to_string(),
        };
        groups.push(DayGroup {
            day,
            label,
            entries: vec![entry],
        });
    }
    groups
}

/// Clock time like `9:05 AM`.
pub fn format_time<Tz>(ts: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    local_time(ts, tz).map_or_else(
        || ts.to_string(),
        |local| local.format("%-I:%M %p").to_string(),
    )
}

/// Short day label like `Sat, Oct 18`.
pub fn format_date<Tz>(ts: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    local_time(ts, tz).map_or_else(
        || ts.to_string(),
        |local| local.format("%a, %b %-d").to_string(),
    )
}

fn local_time<Tz: TimeZone>(ts: i64, tz: &Tz) -> Option<DateTime<Tz>> {
    DateTime::from_timestamp_millis(ts).map(|utc| utc.with_timezone(tz))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::Category;

    // 2025-10-18T09:05:00Z (a Saturday)
    const SAT_MORNING: i64 = 1_760_778_300_000;
    const HOUR: i64 = 3_600_000;

    #[test]
    fn sorted_desc_orders_newest_first() {
        let entries = vec![
            LogEntry::tapped(Category::Eat, 10, None),
            LogEntry::tapped(Category::Drink, 30, None),
            LogEntry::tapped(Category::Feel, 20, None),
        ];
        let order = sorted_desc(&entries)
            .into_iter()
            .map(|entry| entry.ts)
            .collect::<Vec<_>>();
        assert_eq!(order, vec![30, 20, 10]);
    }

    #[test]
    fn sorted_desc_keeps_insertion_order_on_ties() {
        let newer = LogEntry::tapped(Category::Eat, 10, None);
        let older = LogEntry::tapped(Category::Drink, 10, None);
        let entries = vec![newer.clone(), older.clone()];
        let sorted = sorted_desc(&entries);
        assert_eq!(sorted[0].id, newer.id);
        assert_eq!(sorted[1].id, older.id);
    }

    #[test]
    fn formats_twelve_hour_clock() {
        assert_eq!(format_time(SAT_MORNING, &Utc), "9:05 AM");
        assert_eq!(format_time(SAT_MORNING + 4 * HOUR, &Utc), "1:05 PM");
        assert_eq!(format_time(SAT_MORNING - 9 * HOUR, &Utc), "12:05 AM");
        assert_eq!(format_date(SAT_MORNING, &Utc), "Sat, Oct 18");
    }

    #[test]
    fn groups_consecutive_entries_by_day() {
        let entries = vec![
            LogEntry::tapped(Category::Eat, SAT_MORNING + 2 * HOUR, None),
            LogEntry::tapped(Category::Drink, SAT_MORNING, None),
            LogEntry::tapped(Category::Feel, SAT_MORNING - 12 * HOUR, None),
        ];
        let sorted = sorted_desc(&entries);
        let groups = group_by_day(&sorted, &Utc);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "Sat, Oct 18");
        assert_eq!(groups[0].entries.len(), 2);
        assert_eq!(groups[1].label, "Fri, Oct 17");
        assert_eq!(groups[1].entries.len(), 1);
    }

    #[test]
    fn unrepresentable_timestamps_stay_visible() {
        let entries = vec![
            LogEntry::tapped(Category::Eat, i64::MAX, None),
            LogEntry::tapped(Category::Drink, SAT_MORNING, None),
        ];
        let sorted = sorted_desc(&entries);
        let groups = group_by_day(&sorted, &Utc);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].day, None);
        assert_eq!(groups[0].label, "Unknown date");
        assert_eq!(groups[0].entries[0].ts, i64::MAX);
        assert_eq!(format_time(i64::MAX, &Utc), i64::MAX.to_string());
        assert_eq!(groups[1].label, "Sat, Oct 18");
    }
}
