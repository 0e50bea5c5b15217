//! Token-efficient single-line rendering of recalled memories.

use crate::markdown::strip_markdown;
use chrono::{DateTime, Datelike, Utc};
use mnemon_rs_protocol::MemoryRecord;

/// Render memories as `[label, when] text` lines relative to the current time.
pub fn format_memories_compact(records: &[MemoryRecord]) -> String {
    format_memories_compact_at(records, Utc::now())
}

/// Render memories as compact lines relative to `now`.
///
/// Lines keep input order and are joined with `\n`; an empty slice renders as
/// an empty string.
pub fn format_memories_compact_at(records: &[MemoryRecord], now: DateTime<Utc>) -> String {
    records
        .iter()
        .map(|record| format_memory_line(record, now))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render one memory line.
pub fn format_memory_line(record: &MemoryRecord, now: DateTime<Utc>) -> String {
    let text = strip_markdown(&record.text);
    let label = record.memory_type.as_ref().map(|kind| kind.label());
    let when = record.reference_time().map(|at| relative_date(at, now));
    match (label, when) {
        (Some(label), Some(when)) => format!("[{label}, {when}] {text}"),
        (Some(label), None) => format!("[{label}] {text}"),
        (None, Some(when)) => format!("[{when}] {text}"),
        (None, None) => text,
    }
}

/// Describe `at` relative to `now` by calendar day.
///
/// Recent dates get short relative forms, older ones an abbreviated month and
/// day, with the year added outside the current year. Future dates are
/// rendered absolutely.
pub fn relative_date(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now.date_naive() - at.date_naive()).num_days();
    match days {
        0 => "today".to_string(),
        1 => "yesterday".to_string(),
        2..=13 => format!("{days}d ago"),
        14..=59 => format!("{}w ago", days / 7),
        _ if at.year() == now.year() => at.format("%b %-d").to_string(),
        _ => at.format("%b %-d, %Y").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{format_memories_compact, format_memories_compact_at, relative_date};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use mnemon_rs_protocol::{MemoryRecord, MemoryType};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(format_memories_compact(&[]), "");
    }

    #[test]
    fn recent_memories_use_relative_labels() {
        let records = vec![
            MemoryRecord::new("m1", "Igor is CTO")
                .with_type(MemoryType::World)
                .with_occurred_start(now()),
            MemoryRecord::new("m2", "Igor prefers **short** replies")
                .with_type(MemoryType::Observation)
                .with_mentioned_at(now() - Duration::days(1)),
            MemoryRecord::new("m3", "Helped debug the deploy")
                .with_type(MemoryType::Experience)
                .with_mentioned_at(now() - Duration::days(3)),
        ];
        assert_eq!(
            format_memories_compact_at(&records, now()),
            "[fact, today] Igor is CTO\n\
             [insight, yesterday] Igor prefers short replies\n\
             [experience, 3d ago] Helped debug the deploy"
        );
    }

    #[test]
    fn occurred_start_wins_over_mentioned_at() {
        let record = MemoryRecord::new("m1", "Shipped v2")
            .with_type(MemoryType::World)
            .with_mentioned_at(now())
            .with_occurred_start(now() - Duration::days(20));
        assert_eq!(
            format_memories_compact_at(&[record], now()),
            "[fact, 2w ago] Shipped v2"
        );
    }

    #[test]
    fn older_dates_are_absolute() {
        let same_year = Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap();
        let prior_year = Utc.with_ymd_and_hms(2024, 12, 25, 9, 0, 0).unwrap();
        assert_eq!(relative_date(same_year, now()), "Mar 2");
        assert_eq!(relative_date(prior_year, now()), "Dec 25, 2024");
        assert_eq!(relative_date(now() - Duration::days(13), now()), "13d ago");
        assert_eq!(relative_date(now() - Duration::days(59), now()), "8w ago");
    }

    #[test]
    fn future_dates_render_absolutely() {
        let next_year = Utc.with_ymd_and_hms(2026, 1, 4, 9, 0, 0).unwrap();
        assert_eq!(relative_date(next_year, now()), "Jan 4, 2026");
        assert_eq!(relative_date(now() + Duration::days(2), now()), "Jun 17");
    }

    #[test]
    fn missing_dates_and_types_degrade_gracefully() {
        let records = vec![
            MemoryRecord::new("m1", "## Igor is CTO").with_type(MemoryType::World),
            MemoryRecord::new("m2", "likes tea").with_type(MemoryType::from("opinion")),
            MemoryRecord::new("m3", "untyped").with_mentioned_at(now()),
            MemoryRecord::new("m4", "bare"),
        ];
        assert_eq!(
            format_memories_compact_at(&records, now()),
            "[fact] Igor is CTO\n[opinion] likes tea\n[today] untyped\nbare"
        );
    }
}
