// Filtering, searching and ordering of blog entries
use std::cmp::Ordering;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use feruca::Collator;
use regex::Regex;

use crate::models::{BlogEntry, ReadingTime, SortBy};

fn minutes_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)(\d+)\s*min").expect("valid minutes pattern"))
}

fn digits_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+").expect("valid digits pattern"))
}

/// Pull a number of minutes out of a reading time
///
/// Numbers are taken as-is. For text, digits next to "min" win, otherwise
/// the first run of digits anywhere.
pub fn extract_minutes(reading_time: Option<&ReadingTime>) -> Option<f64> {
    match reading_time? {
        ReadingTime::Minutes(m) => Some(*m),
        ReadingTime::Label(label) => {
            let digits = minutes_pattern()
                .captures(label)
                .and_then(|c| c.get(1))
                .or_else(|| digits_pattern().find(label))?;
            digits.as_str().parse::<f64>().ok()
        }
    }
}

/// Parse a published date: RFC 3339, a naive date-time, or a bare date
pub fn parse_published_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Reorder entries in place; `SortBy::None` leaves them untouched
///
/// Sorting is stable. Entries without a usable date or reading time go last.
pub fn sort_entries(entries: &mut [BlogEntry], sort_by: SortBy) {
    match sort_by {
        SortBy::Date => entries.sort_by_cached_key(|e| {
            std::cmp::Reverse(e.published_date.as_deref().and_then(parse_published_date))
        }),
        SortBy::ReadingTime => entries.sort_by(|a, b| {
            let a = extract_minutes(a.reading_time.as_ref()).unwrap_or(f64::INFINITY);
            let b = extract_minutes(b.reading_time.as_ref()).unwrap_or(f64::INFINITY);
            a.total_cmp(&b)
        }),
        SortBy::Category => {
            let mut collator = Collator::default();
            entries.sort_by(|a, b| compare_category(&mut collator, a, b));
        }
        SortBy::None => {}
    }
}

fn category_key(entry: &BlogEntry) -> String {
    entry.category.as_deref().unwrap_or("").to_lowercase()
}

/// Case-insensitive Unicode collation; a missing category counts as empty
fn compare_category(collator: &mut Collator, a: &BlogEntry, b: &BlogEntry) -> Ordering {
    collator.collate(category_key(a).as_str(), category_key(b).as_str())
}

/// Entries whose category or one of whose tags equals `value`, ignoring case
///
/// An empty value keeps everything.
pub fn filter_entries(items: &[BlogEntry], value: &str) -> Vec<BlogEntry> {
    if value.is_empty() {
        return items.to_vec();
    }

    let wanted = value.to_lowercase();
    items
        .iter()
        .filter(|entry| {
            let category_matches = entry
                .category
                .as_deref()
                .is_some_and(|c| c.to_lowercase() == wanted);
            category_matches || entry.tags.iter().any(|t| t.to_lowercase() == wanted)
        })
        .cloned()
        .collect()
}

/// Entries whose title or content contains `query`, ignoring case
pub fn search_entries(items: &[BlogEntry], query: &str) -> Vec<BlogEntry> {
    let needle = query.trim().to_lowercase();
    let contains = |field: &Option<String>| {
        field
            .as_deref()
            .is_some_and(|text| text.to_lowercase().contains(&needle))
    };

    items
        .iter()
        .filter(|entry| contains(&entry.title) || contains(&entry.content))
        .cloned()
        .collect()
}
