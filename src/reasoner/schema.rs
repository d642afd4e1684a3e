//! Expected shape of model output, and the validation that turns raw model
//! text into [`CaseEvent`]s.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::errors::{AppError, AppResult};
use crate::core::types::{CaseEvent, ChronologyAnalysis, DocumentEvents};
use crate::reasoner::assembler::{dedupe_parties, parse_table};
use crate::reasoner::dates::parse_event_date;

/// One event as the model reports it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EventRecord {
    /// What happened, specific and self-contained.
    #[serde(alias = "event")]
    pub description: String,
    /// `YYYY-MM-DD`, or null when the document gives no usable date.
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub date: Option<String>,
    /// People or organisations involved.
    #[serde(default, alias = "participants", deserialize_with = "list_or_csv")]
    #[schemars(with = "Vec<String>")]
    pub parties: Vec<String>,
    /// Document reference the event came from.
    #[serde(default, alias = "source", deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub source_document: Option<String>,
    /// Significance of the event for the case.
    #[serde(
        default,
        alias = "observation",
        alias = "ai_observation",
        deserialize_with = "lenient_string"
    )]
    #[schemars(with = "Option<String>")]
    pub ai_observations: Option<String>,
}

/// Per-document extraction answer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractionPayload {
    /// Two or three sentences summarising the document.
    #[serde(default)]
    pub summary: Option<String>,
    pub events: Vec<EventRecord>,
}

/// Cross-document reasoning answer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReasoningPayload {
    pub events: Vec<EventRecord>,
    #[serde(default)]
    pub key_observations: Vec<String>,
    #[serde(default)]
    pub potential_gaps: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ReasoningOutcome {
    pub events: Vec<CaseEvent>,
    pub analysis: ChronologyAnalysis,
}

pub fn extraction_schema_json() -> String {
    let schema = schemars::schema_for!(ExtractionPayload);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

pub fn reasoning_schema_json() -> String {
    let schema = schemars::schema_for!(ReasoningPayload);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn list_or_csv<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => text.split(',').map(|p| p.trim().to_string()).collect(),
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

// ── Locating JSON in model text ───────────────────────────────────────────────

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after[body_start..];
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }
    trimmed
}

/// Finds and decodes the JSON payload inside model text, tolerating prose
/// and code fences around it.
pub fn locate_json(text: &str) -> Option<Value> {
    let body = strip_code_fence(text);
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return Some(value);
    }

    let object = slice_between(body, '{', '}');
    let array = slice_between(body, '[', ']');
    let object_first = match (body.find('{'), body.find('[')) {
        (Some(o), Some(a)) => o < a,
        (Some(_), None) => true,
        _ => false,
    };
    let candidates = if object_first {
        [object, array]
    } else {
        [array, object]
    };
    candidates
        .into_iter()
        .flatten()
        .find_map(|slice| serde_json::from_str::<Value>(slice).ok())
}

fn slice_between(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

// ── Validation ────────────────────────────────────────────────────────────────

fn record_to_event(record: EventRecord, source_document: &str) -> Option<CaseEvent> {
    let description = record.description.split_whitespace().collect::<Vec<_>>().join(" ");
    if description.is_empty() {
        return None;
    }
    Some(CaseEvent {
        source_document: source_document.to_string(),
        date: record.date.as_deref().and_then(parse_event_date),
        description,
        parties: dedupe_parties(&record.parties),
        observation: record.ai_observations.unwrap_or_default().trim().to_string(),
        summary: None,
    })
}

/// Converts raw items, skipping the invalid ones. Errors only when items were
/// present and none survived.
fn validate_items<F>(
    items: Vec<Value>,
    context: &str,
    raw: &str,
    source_for: F,
) -> AppResult<Vec<CaseEvent>>
where
    F: Fn(&EventRecord) -> String,
{
    let total = items.len();
    let mut events = Vec::with_capacity(total);
    for item in items {
        match serde_json::from_value::<EventRecord>(item) {
            Ok(record) => {
                let source = source_for(&record);
                match record_to_event(record, &source) {
                    Some(event) => events.push(event),
                    None => tracing::warn!(context, "skipping event with empty description"),
                }
            }
            Err(err) => tracing::warn!(context, error = %err, "skipping malformed event"),
        }
    }

    if total > 0 && events.is_empty() {
        return Err(AppError::parse(
            format!(
                "none of the {total} events returned for {context} matched the expected schema"
            ),
            raw,
        ));
    }
    Ok(events)
}

fn is_event_object(map: &serde_json::Map<String, Value>) -> bool {
    map.contains_key("description") || map.contains_key("event")
}

/// Validates a per-document extraction answer. Accepts the documented object
/// form, a bare array of events, or a single event object.
pub fn parse_extraction(raw: &str, document_name: &str) -> AppResult<DocumentEvents> {
    let value = locate_json(raw)
        .ok_or_else(|| AppError::parse(format!("no JSON payload found for {document_name}"), raw))?;

    let (summary, items) = match value {
        Value::Array(items) => (None, items),
        Value::Object(mut map) => {
            if let Some(Value::Array(items)) = map.remove("events") {
                let summary = map
                    .remove("summary")
                    .and_then(|v| v.as_str().map(|s| s.trim().to_string()))
                    .filter(|s| !s.is_empty());
                (summary, items)
            } else if is_event_object(&map) {
                tracing::warn!(document = %document_name, "model returned a single event object");
                (None, vec![Value::Object(map)])
            } else {
                return Err(AppError::parse(
                    format!("JSON for {document_name} has no events list"),
                    raw,
                ));
            }
        }
        _ => {
            return Err(AppError::parse(
                format!("JSON for {document_name} is neither an object nor an array"),
                raw,
            ))
        }
    };

    // The real file name always wins over whatever reference the model cites.
    let mut events = validate_items(items, document_name, raw, |_| document_name.to_string())?;
    for event in &mut events {
        event.summary = summary.clone();
    }
    Ok(DocumentEvents {
        document_name: document_name.to_string(),
        summary,
        events,
    })
}

/// Validates the reasoning answer: JSON object, bare array, or a markdown
/// table in the chronology layout.
pub fn parse_reasoning(raw: &str) -> AppResult<ReasoningOutcome> {
    let claimed_source = |record: &EventRecord| record.source_document.clone().unwrap_or_default();

    match locate_json(raw) {
        Some(Value::Array(items)) => Ok(ReasoningOutcome {
            events: validate_items(items, "chronology", raw, claimed_source)?,
            analysis: ChronologyAnalysis::default(),
        }),
        Some(Value::Object(mut map)) => {
            let items = match map.remove("events") {
                Some(Value::Array(items)) => items,
                _ if is_event_object(&map) => vec![Value::Object(map.clone())],
                _ => {
                    return Err(AppError::parse(
                        "chronology JSON has no events list",
                        raw,
                    ))
                }
            };
            let analysis = ChronologyAnalysis {
                key_observations: string_list(map.get("key_observations")),
                potential_gaps: string_list(map.get("potential_gaps")),
                recommendations: string_list(map.get("recommendations")),
            };
            Ok(ReasoningOutcome {
                events: validate_items(items, "chronology", raw, claimed_source)?,
                analysis,
            })
        }
        Some(_) => Err(AppError::parse("chronology JSON has an unexpected shape", raw)),
        None => parse_reasoning_table(raw),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn parse_reasoning_table(raw: &str) -> AppResult<ReasoningOutcome> {
    let table = parse_table(raw).ok_or_else(|| {
        AppError::parse("chronology answer is neither JSON nor a markdown table", raw)
    })?;
    if table.column(&["Event", "Description", "Event Description"]).is_none() {
        return Err(AppError::parse(
            "chronology table has no event/description column",
            raw,
        ));
    }

    let items: Vec<Value> = table
        .rows
        .iter()
        .map(|row| {
            serde_json::json!({
                "description": table.cell(row, &["Event", "Description", "Event Description"]),
                "date": table.cell(row, &["Date"]),
                "parties": table.cell(row, &["Parties", "Parties Involved"]).unwrap_or(""),
                "source_document": table.cell(row, &["File", "Source", "Source Document"]),
                "ai_observations": table.cell(
                    row,
                    &["AI Observation", "AI Observations", "Observation"]
                ),
            })
        })
        .collect();

    let claimed_source = |record: &EventRecord| record.source_document.clone().unwrap_or_default();
    Ok(ReasoningOutcome {
        events: validate_items(items, "chronology table", raw, claimed_source)?,
        analysis: ChronologyAnalysis::default(),
    })
}
