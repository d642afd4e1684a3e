use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::extraction::normalize::month_number;

const NULL_MARKERS: &[&str] = &["", "null", "none", "n/a", "na", "unknown", "undated", "tbd", "-"];

const DAY_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%d %B, %Y",
];

/// Parses a model-supplied event date. Returns `None` for null markers and
/// for anything that is not a real calendar date.
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim().trim_matches(|c: char| c == '"' || c == '\'').trim();
    if NULL_MARKERS.contains(&value.to_ascii_lowercase().as_str()) {
        return None;
    }

    let cleaned = strip_ordinals(&value.replace("Sept ", "Sep ").replace("sept ", "sep "));

    for format in DAY_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, format) {
            return Some(date);
        }
    }

    if cleaned.len() == 8 && cleaned.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::from_ymd_opt(
            cleaned[..4].parse().ok()?,
            cleaned[4..6].parse().ok()?,
            cleaned[6..].parse().ok()?,
        );
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&cleaned) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    if cleaned.len() > 10 && cleaned.is_char_boundary(10) {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned[..10], "%Y-%m-%d") {
            return Some(date);
        }
    }

    parse_month_precision(&cleaned)
}

/// `YYYY-MM` and `Month YYYY` resolve to the first day of the month.
fn parse_month_precision(value: &str) -> Option<NaiveDate> {
    if let Some((year, month)) = value.split_once('-') {
        if year.len() == 4 && (1..=2).contains(&month.len()) {
            return NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1);
        }
    }

    let mut words = value.split_whitespace();
    let (Some(first), Some(second), None) = (words.next(), words.next(), words.next()) else {
        return None;
    };
    let month = month_number(first.trim_end_matches(','))?;
    let year: i32 = second.parse().ok()?;
    if !(1000..=9999).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn strip_ordinals(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let (digits, rest) = word.split_at(
                word.char_indices()
                    .find(|(_, c)| !c.is_ascii_digit())
                    .map(|(i, _)| i)
                    .unwrap_or(word.len()),
            );
            let suffix = rest.trim_end_matches(',').to_ascii_lowercase();
            if !digits.is_empty() && matches!(suffix.as_str(), "st" | "nd" | "rd" | "th") {
                format!("{digits}{}", &rest[2..])
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
