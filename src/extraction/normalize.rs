//! Text cleanup applied to every extracted document before it reaches the
//! model.
//!
//! The date rewriting here is a best-effort textual heuristic: it only nudges
//! recognisable date substrings toward `YYYY-MM-DD` so the model sees one
//! format. It is not a date parser; event dates are parsed separately by
//! [`crate::reasoner::dates`].

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};

const MONTHS: &str = "january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec";

static SLASH_US: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap());
static DASH_US: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})-(\d{1,2})-(\d{4})\b").unwrap());
static SLASH_ISO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})/(\d{1,2})/(\d{1,2})\b").unwrap());
static MONTH_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({MONTHS})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b"
    ))
    .unwrap()
});
static DAY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+({MONTHS})\.?,?\s+(\d{{4}})\b"
    ))
    .unwrap()
});
static SPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{00a0}\u{000c}]+").unwrap());
static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Full cleanup pass: line endings, whitespace, then date rewriting.
pub fn normalize_text(raw: &str) -> String {
    let text = normalize_whitespace(raw);
    rewrite_dates(&text)
}

pub fn normalize_whitespace(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let collapsed = SPACE_RUNS.replace_all(&unified, " ");
    let trimmed_lines = collapsed
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    BLANK_RUNS
        .replace_all(&trimmed_lines, "\n\n")
        .trim()
        .to_string()
}

/// Rewrites recognisable date substrings to `YYYY-MM-DD`. Substrings that
/// would not form a real calendar date are left untouched.
pub fn rewrite_dates(text: &str) -> String {
    let text = SLASH_ISO.replace_all(text, |caps: &Captures| {
        canonical(&caps[1], &caps[2], &caps[3]).unwrap_or_else(|| caps[0].to_string())
    });
    let text = SLASH_US.replace_all(&text, |caps: &Captures| {
        canonical(&caps[3], &caps[1], &caps[2]).unwrap_or_else(|| caps[0].to_string())
    });
    let text = DASH_US.replace_all(&text, |caps: &Captures| {
        canonical(&caps[3], &caps[1], &caps[2]).unwrap_or_else(|| caps[0].to_string())
    });
    let text = MONTH_FIRST.replace_all(&text, |caps: &Captures| {
        month_number(&caps[1])
            .and_then(|month| canonical(&caps[3], &month.to_string(), &caps[2]))
            .unwrap_or_else(|| caps[0].to_string())
    });
    let text = DAY_FIRST.replace_all(&text, |caps: &Captures| {
        month_number(&caps[2])
            .and_then(|month| canonical(&caps[3], &month.to_string(), &caps[1]))
            .unwrap_or_else(|| caps[0].to_string())
    });
    text.into_owned()
}

fn canonical(year: &str, month: &str, day: &str) -> Option<String> {
    let date = NaiveDate::from_ymd_opt(
        year.parse().ok()?,
        month.parse().ok()?,
        day.parse().ok()?,
    )?;
    Some(date.format("%Y-%m-%d").to_string())
}

pub(crate) fn month_number(name: &str) -> Option<u32> {
    let lower = name.trim_end_matches('.').to_ascii_lowercase();
    let month = match lower.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
