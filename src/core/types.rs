use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Text => "text",
        }
    }
}

/// An uploaded file. Lives only for the duration of one request.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Wraps already-extracted text, as sent by the JSON text endpoint.
    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, "text/plain", text.into().into_bytes())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedText {
    pub document_name: String,
    pub kind: DocumentKind,
    pub text: String,
    pub char_count: usize,
    pub checksum: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaseEvent {
    pub source_document: String,
    pub date: Option<NaiveDate>,
    pub description: String,
    pub parties: Vec<String>,
    pub observation: String,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEvents {
    pub document_name: String,
    pub summary: Option<String>,
    pub events: Vec<CaseEvent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChronologyAnalysis {
    pub key_observations: Vec<String>,
    pub potential_gaps: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chronology {
    pub case_description: String,
    pub events: Vec<CaseEvent>,
    pub analysis: ChronologyAnalysis,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueStage {
    Extraction,
    Duplicate,
    EventExtraction,
    Reasoning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentIssue {
    pub document_name: String,
    pub stage: IssueStage,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChronologyReport {
    pub request_id: String,
    pub chronology: Chronology,
    pub markdown: String,
    pub issues: Vec<DocumentIssue>,
    pub processed_documents: Vec<String>,
    pub token_usage: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChronologyResponse {
    pub request_id: String,
    pub events: Vec<CaseEvent>,
    pub markdown_output: String,
    pub analysis: ChronologyAnalysis,
    pub issues: Vec<DocumentIssue>,
    pub processed_documents: Vec<String>,
    pub token_usage: Value,
}

impl From<ChronologyReport> for ChronologyResponse {
    fn from(report: ChronologyReport) -> Self {
        Self {
            request_id: report.request_id,
            events: report.chronology.events,
            markdown_output: report.markdown,
            analysis: report.chronology.analysis,
            issues: report.issues,
            processed_documents: report.processed_documents,
            token_usage: report.token_usage,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFromTextRequest {
    #[serde(default, alias = "case_description")]
    pub case_description: String,
    #[serde(alias = "documents_text")]
    pub documents_text: Vec<String>,
    #[serde(alias = "document_names")]
    pub document_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
