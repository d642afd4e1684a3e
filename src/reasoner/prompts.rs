use crate::core::types::CaseEvent;
use crate::reasoner::assembler::PLACEHOLDER;
use crate::reasoner::schema::{extraction_schema_json, reasoning_schema_json};

pub const EXTRACTION_TEMPERATURE: f64 = 0.1;
pub const CHRONOLOGY_TEMPERATURE: f64 = 0.2;

const NO_CASE_DESCRIPTION: &str = "(no case description provided)";

pub const EVENT_EXTRACTION_SYSTEM_INSTRUCTION: &str = "\
You extract key events, dates and parties from legal documents.

- Events: describe what happened, specifically and self-contained.
- Dates: convert every date to YYYY-MM-DD. Use null when no date is given.
- Parties: list every person or organisation involved, including roles such as plaintiff, defendant or CEO.
- Source: give the document reference the event comes from.

Return one JSON object with a short `summary` of the document and an `events` array.
Each event looks like:
{\"event\": \"Entered into a merger agreement\", \"date\": \"2022-01-05\", \"parties\": [\"Company A\", \"Company B\"], \"source\": \"ABC-123\"}

Return an empty `events` array when the document describes no events. Do not add commentary outside the JSON.";

pub const CHRONOLOGY_SYSTEM_INSTRUCTION: &str = "\
You are a legal chronology expert. You receive events extracted from several case documents and organise them into one coherent timeline.

1. Verify the chronological order and sort by date, undated events last.
2. Identify inconsistencies or conflicting dates.
3. Merge duplicates or split compound events where it improves clarity.
4. For every event add `ai_observations`: its significance, how it relates to other events and to the case.
5. Note gaps in the timeline and recommend follow-up.

Keep `source_document` equal to the file name given for each event.";

/// System instruction for per-document extraction, with the expected JSON
/// schema appended.
pub fn extraction_system_instruction() -> String {
    let mut text = String::from(EVENT_EXTRACTION_SYSTEM_INSTRUCTION);
    text.push_str("\n\nJSON schema of the answer:\n");
    text.push_str(&extraction_schema_json());
    text
}

pub fn chronology_system_instruction() -> String {
    let mut text = String::from(CHRONOLOGY_SYSTEM_INSTRUCTION);
    text.push_str("\n\nAnswer with one JSON object matching this schema:\n");
    text.push_str(&reasoning_schema_json());
    text.push_str("\nA markdown table with columns File | Date | Event | Parties | AI Observation is also accepted.\n");
    text
}

fn case_or_placeholder(case_description: &str) -> &str {
    let trimmed = case_description.trim();
    if trimmed.is_empty() {
        NO_CASE_DESCRIPTION
    } else {
        trimmed
    }
}

pub fn extraction_prompt(text: &str, document_name: &str, case_description: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str("CASE DESCRIPTION:\n");
    prompt.push_str(case_or_placeholder(case_description));
    prompt.push_str("\n\nDOCUMENT NAME:\n");
    prompt.push_str(document_name);
    prompt.push_str("\n\nDOCUMENT TEXT:\n");
    prompt.push_str(text);
    prompt.push_str("\n\nExtract the events of this document as JSON.\n");
    prompt
}

pub fn chronology_prompt(case_description: &str, events: &[CaseEvent]) -> String {
    let mut prompt = String::new();
    prompt.push_str("CASE DESCRIPTION:\n");
    prompt.push_str(case_or_placeholder(case_description));
    prompt.push_str("\n\nEVENTS:\n");
    for (idx, event) in events.iter().enumerate() {
        let date = event
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let parties = if event.parties.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            event.parties.join(", ")
        };
        prompt.push_str(&format!(
            "{}. Date: {date}\n   Description: {}\n   Parties: {parties}\n   Source: {}\n",
            idx + 1,
            event.description,
            event.source_document
        ));
    }
    prompt.push_str("\nReturn the organised chronology.\n");
    prompt
}
