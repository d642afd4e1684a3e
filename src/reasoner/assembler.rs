//! Merges per-document events into one chronology and renders it as markdown.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::core::types::{CaseEvent, Chronology, DocumentEvents};

pub const TABLE_HEADERS: [&str; 6] = [
    "File",
    "Date",
    "Event",
    "Parties",
    "AI Observation",
    "Summary",
];
pub const PLACEHOLDER: &str = "N/A";

/// Trims names, drops blanks and removes case-insensitive duplicates. The
/// first spelling seen wins and order is preserved.
pub fn dedupe_parties<I, S>(parties: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for party in parties {
        let name = party.as_ref().split_whitespace().collect::<Vec<_>>().join(" ");
        if name.is_empty() {
            continue;
        }
        if seen.insert(name.to_lowercase()) {
            out.push(name);
        }
    }
    out
}

/// Dated events ascending, undated after them. `sort_by` is stable, so ties
/// and the undated tail keep their incoming order.
pub fn sort_events(events: &mut [CaseEvent]) {
    events.sort_by(|a, b| match (a.date, b.date) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Concatenates document event lists in upload order, dedupes parties and
/// sorts the result.
pub fn assemble(documents: &[DocumentEvents]) -> Vec<CaseEvent> {
    let mut events: Vec<CaseEvent> = documents
        .iter()
        .flat_map(|doc| {
            doc.events.iter().cloned().map(move |mut event| {
                event.parties = dedupe_parties(&event.parties);
                if event.summary.is_none() {
                    event.summary = doc.summary.clone();
                }
                event
            })
        })
        .collect();
    sort_events(&mut events);
    events
}

/// Result of laying the reasoning stage's answer over the extracted events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReasonedMerge {
    pub events: Vec<CaseEvent>,
    /// Reasoned events with no extracted counterpart. They never become rows.
    pub unmatched: Vec<CaseEvent>,
}

fn folded(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn same_event(extracted: &CaseEvent, reasoned: &CaseEvent) -> bool {
    extracted.date == reasoned.date
        && folded(&extracted.description) == folded(&reasoned.description)
}

/// Rows always come from `extracted`, in its order. A reasoned event only
/// contributes its observation to the extracted event with the same date and
/// description, and only where extraction left the observation blank.
pub fn merge_reasoned(extracted: &[CaseEvent], reasoned: Vec<CaseEvent>) -> ReasonedMerge {
    let mut events = extracted.to_vec();
    let mut claimed = vec![false; events.len()];
    let mut unmatched = Vec::new();

    for candidate in reasoned {
        let slot = events
            .iter()
            .zip(&claimed)
            .position(|(event, taken)| !taken && same_event(event, &candidate));
        let Some(idx) = slot else {
            unmatched.push(candidate);
            continue;
        };
        claimed[idx] = true;
        let observation = candidate.observation.trim();
        if events[idx].observation.trim().is_empty() && !observation.is_empty() {
            events[idx].observation = observation.to_string();
        }
    }

    ReasonedMerge { events, unmatched }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

fn cell(value: &str) -> String {
    let flat = value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|");
    if flat.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        flat
    }
}

pub fn render_table(events: &[CaseEvent]) -> String {
    let mut table = format!("| {} |\n", TABLE_HEADERS.join(" | "));
    table.push_str(&format!(
        "|{}|\n",
        TABLE_HEADERS.iter().map(|_| "---").collect::<Vec<_>>().join("|")
    ));

    for event in events {
        let date = event
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        let row = [
            cell(&event.source_document),
            date,
            cell(&event.description),
            cell(&event.parties.join(", ")),
            cell(&event.observation),
            cell(event.summary.as_deref().unwrap_or("")),
        ];
        table.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    table
}

/// Full downloadable document: title, table, then the analysis sections
/// that have content.
pub fn render_document(chronology: &Chronology) -> String {
    let mut output = String::from("# Case Chronology\n\n");
    let case = chronology.case_description.trim();
    if !case.is_empty() {
        output.push_str(&format!(
            "**Case:** {}\n\n",
            case.split_whitespace().collect::<Vec<_>>().join(" ")
        ));
    }
    output.push_str("## Timeline of Events\n\n");
    output.push_str(&render_table(&chronology.events));

    let sections = [
        ("Key Observations", &chronology.analysis.key_observations),
        ("Timeline Gaps", &chronology.analysis.potential_gaps),
        ("Recommendations", &chronology.analysis.recommendations),
    ];
    for (title, items) in sections {
        if items.is_empty() {
            continue;
        }
        output.push_str(&format!("\n## {title}\n\n"));
        for item in items {
            output.push_str(&format!("- {item}\n"));
        }
    }
    output
}

// ── Parsing ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl MarkdownTable {
    /// Index of the first header matching any of `names`, ignoring case.
    pub fn column(&self, names: &[&str]) -> Option<usize> {
        self.headers.iter().position(|header| {
            names
                .iter()
                .any(|name| header.trim().eq_ignore_ascii_case(name))
        })
    }

    pub fn cell<'a>(&'a self, row: &'a [String], names: &[&str]) -> Option<&'a str> {
        self.column(names)
            .and_then(|idx| row.get(idx))
            .map(String::as_str)
            .filter(|value| *value != PLACEHOLDER && !value.is_empty())
    }
}

/// Parses the first pipe table found in `markdown`. Escaped pipes inside
/// cells are restored.
pub fn parse_table(markdown: &str) -> Option<MarkdownTable> {
    let lines: Vec<&str> = markdown.lines().map(str::trim).collect();
    let start = lines.windows(2).position(|pair| {
        pair[0].starts_with('|') && is_separator_row(pair[1])
    })?;

    let headers = split_row(lines[start]);
    let mut rows = Vec::new();
    for line in &lines[start + 2..] {
        if !line.starts_with('|') {
            break;
        }
        let mut row = split_row(line);
        row.resize(headers.len(), String::new());
        rows.push(row);
    }
    Some(MarkdownTable { headers, rows })
}

fn is_separator_row(line: &str) -> bool {
    line.starts_with('|')
        && line.contains('-')
        && line
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

fn split_row(line: &str) -> Vec<String> {
    let inner = line.trim().trim_start_matches('|');
    let inner = match inner.strip_suffix('|') {
        Some(rest) if !rest.ends_with('\\') => rest,
        _ => inner,
    };

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => {
                cells.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn event(source: &str, date: Option<&str>, description: &str) -> CaseEvent {
        CaseEvent {
            source_document: source.to_string(),
            date: date.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            description: description.to_string(),
            parties: vec![],
            observation: String::new(),
            summary: None,
        }
    }

    #[test]
    fn dedupe_is_case_insensitive_and_keeps_first_spelling() {
        assert_eq!(
            dedupe_parties(["Acme Corp", "acme corp", "  ", "Beta  LLC", "ACME CORP"]),
            vec!["Acme Corp".to_string(), "Beta LLC".to_string()]
        );
    }

    #[test]
    fn cells_escape_pipes_and_flatten_newlines() {
        let mut e = event("a.pdf", None, "Paid | refunded\nlater");
        e.observation = String::new();
        let table = render_table(&[e]);
        assert!(table.contains("Paid \\| refunded later"));
        assert!(table.contains("| a.pdf | N/A |"));
    }

    #[test]
    fn parse_table_restores_escaped_pipes() {
        let table = render_table(&[event("a.pdf", Some("2023-01-05"), "A | B")]);
        let parsed = parse_table(&table).expect("table");
        assert_eq!(parsed.headers, TABLE_HEADERS.to_vec());
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0][2], "A | B");
    }

    #[test]
    fn parse_table_ignores_prose_before_and_after() {
        let md = "Here you go:\n\n| Date | Description |\n|---|---|\n| 2020-01-01 | Filed |\n\nThanks";
        let parsed = parse_table(md).expect("table");
        assert_eq!(parsed.rows, vec![vec!["2020-01-01".to_string(), "Filed".to_string()]]);
        assert_eq!(parsed.column(&["description"]), Some(1));
    }

    #[test]
    fn merge_keeps_extracted_rows_and_fills_blank_observations() {
        let mut signed = event("lease.pdf", Some("2023-01-05"), "Lease signed");
        signed.parties = vec!["Landlord".to_string()];
        let mut served = event("notice.pdf", Some("2023-02-01"), "Notice served");
        served.observation = "Starts the cure period.".to_string();
        let extracted = vec![signed.clone(), served.clone()];

        let mut reasoned_signed = event("doc-ref-7", Some("2023-01-05"), "lease  SIGNED");
        reasoned_signed.observation = "Tenancy begins.".to_string();
        reasoned_signed.parties = vec!["Someone else".to_string()];
        let mut reasoned_served = event("notice.pdf", Some("2023-02-01"), "Notice served");
        reasoned_served.observation = "Different take.".to_string();

        let merged = merge_reasoned(&extracted, vec![reasoned_served, reasoned_signed]);

        assert!(merged.unmatched.is_empty());
        assert_eq!(merged.events.len(), 2);
        assert_eq!(merged.events[0].source_document, "lease.pdf");
        assert_eq!(merged.events[0].description, "Lease signed");
        assert_eq!(merged.events[0].parties, vec!["Landlord".to_string()]);
        assert_eq!(merged.events[0].observation, "Tenancy begins.");
        assert_eq!(merged.events[1].observation, "Starts the cure period.");
    }

    #[test]
    fn merge_never_turns_reasoned_events_into_rows() {
        let extracted = vec![event("lease.pdf", Some("2019-07-01"), "Lease signed")];
        let reasoned = vec![
            event("doc-ref", Some("2019-07-04"), "Lease signed"),
            event("court", Some("2024-01-01"), "Hearing scheduled"),
        ];

        let merged = merge_reasoned(&extracted, reasoned);

        assert_eq!(merged.events, extracted);
        let unmatched: Vec<_> = merged.unmatched.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(unmatched, vec!["Lease signed", "Hearing scheduled"]);
    }

    #[test]
    fn merge_with_empty_answer_returns_extracted_unchanged() {
        let extracted = vec![event("a.txt", None, "First"), event("b.txt", None, "Second")];
        let merged = merge_reasoned(&extracted, vec![]);
        assert_eq!(merged.events, extracted);
        assert!(merged.unmatched.is_empty());
    }
}
