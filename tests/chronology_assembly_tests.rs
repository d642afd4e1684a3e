use chrono::NaiveDate;

use chronology_lib::core::types::{CaseEvent, Chronology, ChronologyAnalysis, DocumentEvents};
use chronology_lib::reasoner::analysis::analyze;
use chronology_lib::reasoner::assembler::{
    assemble, parse_table, render_document, render_table, sort_events, TABLE_HEADERS,
};
use chronology_lib::reasoner::schema::parse_reasoning;

fn event(
    source: &str,
    date: Option<(i32, u32, u32)>,
    description: &str,
    parties: &[&str],
) -> CaseEvent {
    CaseEvent {
        source_document: source.to_string(),
        date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        description: description.to_string(),
        parties: parties.iter().map(|p| p.to_string()).collect(),
        observation: String::new(),
        summary: None,
    }
}

fn docs() -> Vec<DocumentEvents> {
    vec![
        DocumentEvents {
            document_name: "complaint.pdf".to_string(),
            summary: Some("Complaint filed by Acme.".to_string()),
            events: vec![
                event("complaint.pdf", None, "Oral promise", &["Acme Corp"]),
                event(
                    "complaint.pdf",
                    Some((2023, 6, 1)),
                    "Complaint filed",
                    &["Acme Corp", "acme corp"],
                ),
                event("complaint.pdf", None, "Undated call", &[]),
            ],
        },
        DocumentEvents {
            document_name: "contract.pdf".to_string(),
            summary: None,
            events: vec![
                event(
                    "contract.pdf",
                    Some((2023, 1, 1)),
                    "Contract signed",
                    &["Acme Corp", "Beta LLC"],
                ),
                event("contract.pdf", Some((2023, 6, 1)), "Payment due", &["Beta LLC"]),
            ],
        },
    ]
}

#[test]
fn assemble_sorts_dated_first_and_keeps_order_of_ties() {
    let events = assemble(&docs());
    let descriptions: Vec<_> = events.iter().map(|e| e.description.as_str()).collect();
    assert_eq!(
        descriptions,
        vec![
            "Contract signed",
            "Complaint filed",
            "Payment due",
            "Oral promise",
            "Undated call"
        ]
    );
}

#[test]
fn assemble_dedupes_parties_and_fills_summaries() {
    let events = assemble(&docs());
    let filed = events
        .iter()
        .find(|e| e.description == "Complaint filed")
        .expect("event");
    assert_eq!(filed.parties, vec!["Acme Corp".to_string()]);
    assert_eq!(filed.summary.as_deref(), Some("Complaint filed by Acme."));
}

#[test]
fn sorting_twice_changes_nothing() {
    let mut events = assemble(&docs());
    let once = events.clone();
    sort_events(&mut events);
    assert_eq!(events, once);
}

#[test]
fn all_undated_events_render_in_upload_order() {
    let events = vec![
        event("a.txt", None, "First", &[]),
        event("b.txt", None, "Second", &[]),
        event("c.txt", None, "Third", &[]),
    ];
    let mut sorted = events.clone();
    sort_events(&mut sorted);
    assert_eq!(sorted, events);

    let table = parse_table(&render_table(&sorted)).expect("table");
    let rows: Vec<_> = table.rows.iter().map(|row| row[2].as_str()).collect();
    assert_eq!(rows, vec!["First", "Second", "Third"]);
    assert!(table.rows.iter().all(|row| row[1] == "N/A"));
}

#[test]
fn rendered_table_round_trips_rows_dates_and_descriptions() {
    let events = assemble(&docs());
    let table = parse_table(&render_table(&events)).expect("table");

    assert_eq!(table.headers, TABLE_HEADERS.to_vec());
    assert_eq!(table.rows.len(), events.len());
    for (row, event) in table.rows.iter().zip(&events) {
        let date = event
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "N/A".to_string());
        assert_eq!(row[1], date);
        assert_eq!(row[2], event.description);
    }
}

#[test]
fn rendered_table_is_accepted_as_reasoning_answer() {
    let events = assemble(&docs());
    let outcome = parse_reasoning(&render_table(&events)).expect("table answer");
    assert_eq!(outcome.events.len(), events.len());
    assert_eq!(outcome.events[0].date, events[0].date);
    assert_eq!(outcome.events[0].source_document, "contract.pdf");
    assert_eq!(outcome.events[0].parties, events[0].parties);
}

#[test]
fn document_has_title_table_and_analysis_sections() {
    let events = assemble(&docs());
    let analysis = analyze(&events);
    let chronology = Chronology {
        case_description: "Acme v. Beta\nbreach of contract".to_string(),
        events,
        analysis,
    };
    let markdown = render_document(&chronology);

    assert!(markdown.starts_with("# Case Chronology\n"));
    assert!(markdown.contains("**Case:** Acme v. Beta breach of contract"));
    assert!(markdown.contains("## Timeline of Events"));
    assert!(
        markdown.contains("## Key Observations\n\n- Key parties involved: Acme Corp, Beta LLC")
    );
    assert!(markdown.contains("- Gap of 151 days between events on 2023-01-01 and 2023-06-01"));
    assert!(markdown.contains("- Found 2 events with missing dates."));
}

#[test]
fn empty_analysis_sections_are_omitted() {
    let chronology = Chronology {
        case_description: String::new(),
        events: vec![event("a.txt", Some((2020, 5, 5)), "Only event", &[])],
        analysis: ChronologyAnalysis::default(),
    };
    let markdown = render_document(&chronology);
    assert!(!markdown.contains("**Case:**"));
    assert!(!markdown.contains("## Key Observations"));
    assert!(!markdown.contains("## Recommendations"));
    assert_eq!(parse_table(&markdown).expect("table").rows.len(), 1);
}
