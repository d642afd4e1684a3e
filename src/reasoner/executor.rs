use std::{collections::HashMap, sync::Arc, time::Instant};

use serde_json::Value;
use tracing::Instrument;

use crate::{
    core::{
        errors::{AppError, AppResult},
        types::{
            CaseEvent, Chronology, ChronologyAnalysis, ChronologyReport, Document, DocumentEvents,
            DocumentIssue, ExtractedText, IssueStage,
        },
    },
    extraction::native_parser,
    providers::{LlmProvider, LlmRequest},
    reasoner::{
        analysis::{analyze, merge_analysis},
        assembler::{assemble, merge_reasoned, render_document},
        prompts::{
            chronology_prompt, chronology_system_instruction, extraction_prompt,
            extraction_system_instruction, CHRONOLOGY_TEMPERATURE, EXTRACTION_TEMPERATURE,
        },
        schema::{parse_extraction, parse_reasoning},
    },
};

/// Issue target used for failures that concern the whole chronology rather
/// than one file.
pub const ALL_DOCUMENTS: &str = "(all documents)";

const USAGE_FIELDS: [&str; 3] = ["promptTokenCount", "candidatesTokenCount", "totalTokenCount"];

/// Runs one chronology request end to end: extraction, per-document event
/// extraction, cross-document reasoning, assembly and rendering.
#[derive(Clone)]
pub struct ChronologyExecutor {
    provider: Arc<dyn LlmProvider>,
    max_document_chars: usize,
}

#[derive(Debug, Default)]
struct TokenTally {
    counts: [u64; 3],
    calls: u64,
}

impl TokenTally {
    fn add(&mut self, usage: &Value) {
        self.calls += 1;
        for (slot, field) in self.counts.iter_mut().zip(USAGE_FIELDS) {
            *slot += usage.get(field).and_then(Value::as_u64).unwrap_or(0);
        }
    }

    fn to_json(&self) -> Value {
        serde_json::json!({
            "promptTokenCount": self.counts[0],
            "candidatesTokenCount": self.counts[1],
            "totalTokenCount": self.counts[2],
            "calls": self.calls,
        })
    }
}

/// Auth failures and transient transport failures end the whole request;
/// everything else is reported against the document and skipped.
fn aborts_request(err: &AppError) -> bool {
    err.retryable() || matches!(err, AppError::ProviderAuth)
}

fn issue(document_name: &str, stage: IssueStage, err: &AppError) -> DocumentIssue {
    DocumentIssue {
        document_name: document_name.to_string(),
        stage,
        code: err.code().to_string(),
        message: err.to_string(),
        raw_output: err.raw_output().map(str::to_string),
    }
}

impl ChronologyExecutor {
    pub fn new(provider: Arc<dyn LlmProvider>, max_document_chars: usize) -> Self {
        Self {
            provider,
            max_document_chars,
        }
    }

    pub async fn run(
        &self,
        documents: Vec<Document>,
        case_description: &str,
    ) -> AppResult<ChronologyReport> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("chronology_run", request_id = %request_id);
        self.run_inner(request_id, documents, case_description)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        request_id: String,
        documents: Vec<Document>,
        case_description: &str,
    ) -> AppResult<ChronologyReport> {
        if documents.is_empty() {
            return Err(AppError::InvalidInput(
                "upload at least one document".to_string(),
            ));
        }

        let started = Instant::now();
        tracing::info!(
            documents = documents.len(),
            provider = self.provider.name(),
            "chronology run started"
        );

        let mut issues: Vec<DocumentIssue> = vec![];
        let mut tokens = TokenTally::default();
        let mut seen_checksums: HashMap<String, String> = HashMap::new();
        let mut processed: Vec<DocumentEvents> = vec![];

        for document in documents {
            let name = document.name.clone();
            let extracted = match self.extract_text(document).await {
                Ok(extracted) => extracted,
                Err(err) => {
                    tracing::warn!(document = %name, error = %err, "text extraction failed");
                    issues.push(issue(&name, IssueStage::Extraction, &err));
                    continue;
                }
            };

            if let Some(first) = seen_checksums.get(&extracted.checksum) {
                tracing::info!(
                    document = %name,
                    duplicate_of = %first,
                    "skipping duplicate upload"
                );
                issues.push(DocumentIssue {
                    document_name: name,
                    stage: IssueStage::Duplicate,
                    code: "DUPLICATE_DOCUMENT".to_string(),
                    message: format!("identical content was already uploaded as {first}"),
                    raw_output: None,
                });
                continue;
            }
            seen_checksums.insert(extracted.checksum.clone(), name.clone());

            match self
                .extract_events(&extracted, case_description, &mut tokens)
                .await
            {
                Ok(events) => {
                    tracing::info!(
                        document = %name,
                        events = events.events.len(),
                        "events extracted"
                    );
                    if events.events.is_empty() {
                        issues.push(DocumentIssue {
                            document_name: name,
                            stage: IssueStage::EventExtraction,
                            code: "NO_EVENTS".to_string(),
                            message: "the model found no events in this document".to_string(),
                            raw_output: None,
                        });
                    }
                    processed.push(events);
                }
                Err(err) if aborts_request(&err) => return Err(err),
                Err(err) => {
                    tracing::error!(
                        document = %name,
                        code = err.code(),
                        raw_len = err.raw_output().map(str::len).unwrap_or(0),
                        "event extraction failed"
                    );
                    issues.push(issue(&name, IssueStage::EventExtraction, &err));
                }
            }
        }

        let extracted_events = assemble(&processed);
        if extracted_events.is_empty() {
            return Err(AppError::NoEvents(no_events_message(&issues)));
        }

        let (reasoned, model_analysis) = match self
            .reason(case_description, &extracted_events, &mut tokens)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) if aborts_request(&err) => return Err(err),
            Err(err) => {
                tracing::error!(
                    code = err.code(),
                    raw_len = err.raw_output().map(str::len).unwrap_or(0),
                    "chronology reasoning failed; keeping extracted events"
                );
                issues.push(issue(ALL_DOCUMENTS, IssueStage::Reasoning, &err));
                (vec![], ChronologyAnalysis::default())
            }
        };

        let merged = merge_reasoned(&extracted_events, reasoned);
        if !merged.unmatched.is_empty() {
            tracing::warn!(
                unmatched = merged.unmatched.len(),
                "reasoned events without an extracted counterpart were ignored"
            );
            issues.push(unmatched_issue(&merged.unmatched));
        }
        let events = merged.events;
        let analysis = merge_analysis(model_analysis, analyze(&events));
        let chronology = Chronology {
            case_description: case_description.trim().to_string(),
            events,
            analysis,
        };
        let markdown = render_document(&chronology);

        tracing::info!(
            events = chronology.events.len(),
            issues = issues.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "chronology run finished"
        );

        Ok(ChronologyReport {
            request_id,
            processed_documents: processed
                .iter()
                .map(|doc| doc.document_name.clone())
                .collect(),
            chronology,
            markdown,
            issues,
            token_usage: tokens.to_json(),
        })
    }

    async fn extract_text(&self, document: Document) -> AppResult<ExtractedText> {
        let max_chars = self.max_document_chars;
        let name = document.name.clone();
        // pdf-extract is synchronous and panics on some malformed files.
        tokio::task::spawn_blocking(move || native_parser::extract(&document, max_chars))
            .await
            .map_err(|err| AppError::Extraction(format!("{name}: PDF parser crashed: {err}")))?
    }

    async fn extract_events(
        &self,
        extracted: &ExtractedText,
        case_description: &str,
        tokens: &mut TokenTally,
    ) -> AppResult<DocumentEvents> {
        let request = LlmRequest {
            system_instruction: extraction_system_instruction(),
            prompt: extraction_prompt(&extracted.text, &extracted.document_name, case_description),
            temperature: EXTRACTION_TEMPERATURE,
            json_output: true,
        };
        let response = self.provider.generate(&request).await?;
        tokens.add(&response.token_usage);
        parse_extraction(&response.text, &extracted.document_name)
    }

    async fn reason(
        &self,
        case_description: &str,
        events: &[CaseEvent],
        tokens: &mut TokenTally,
    ) -> AppResult<(Vec<CaseEvent>, ChronologyAnalysis)> {
        let request = LlmRequest {
            system_instruction: chronology_system_instruction(),
            prompt: chronology_prompt(case_description, events),
            temperature: CHRONOLOGY_TEMPERATURE,
            json_output: true,
        };
        let response = self.provider.generate(&request).await?;
        tokens.add(&response.token_usage);
        let outcome = parse_reasoning(&response.text)?;
        Ok((outcome.events, outcome.analysis))
    }
}

fn unmatched_issue(unmatched: &[CaseEvent]) -> DocumentIssue {
    let listed = unmatched
        .iter()
        .map(|event| match event.date {
            Some(date) => format!("{date}: {}", event.description),
            None => event.description.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ");
    DocumentIssue {
        document_name: ALL_DOCUMENTS.to_string(),
        stage: IssueStage::Reasoning,
        code: "UNMATCHED_EVENTS".to_string(),
        message: format!(
            "the chronology pass returned {} event(s) not found in any document; \
             they were left out of the table: {listed}",
            unmatched.len()
        ),
        raw_output: None,
    }
}

fn no_events_message(issues: &[DocumentIssue]) -> String {
    let mut message = String::from("No events could be extracted from any of the documents.");
    for item in issues {
        message.push_str(&format!("\n- {}: {}", item.document_name, item.message));
    }
    message
}
