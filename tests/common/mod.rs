#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chronology_lib::core::config::AppConfig;
use chronology_lib::core::errors::{AppError, AppResult};
use chronology_lib::providers::{LlmProvider, LlmRequest, LlmResponse};
use chronology_lib::AppState;

// ── Scripted provider ─────────────────────────────────────────────────────────

/// Replays queued answers in order and records every request it receives.
#[derive(Default)]
pub struct ScriptedProvider {
    answers: Mutex<VecDeque<AppResult<String>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_answers<I, S>(answers: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::default();
        for answer in answers {
            provider.push_ok(answer);
        }
        Arc::new(provider)
    }

    pub fn push_ok(&self, text: impl Into<String>) {
        self.answers
            .lock()
            .expect("answers lock")
            .push_back(Ok(text.into()));
    }

    pub fn push_err(&self, err: AppError) {
        self.answers.lock().expect("answers lock").push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        let next = self.answers.lock().expect("answers lock").pop_front();
        match next {
            Some(Ok(text)) => Ok(LlmResponse {
                text,
                token_usage: serde_json::json!({
                    "promptTokenCount": 100,
                    "candidatesTokenCount": 20,
                    "totalTokenCount": 120
                }),
            }),
            Some(Err(err)) => Err(err),
            None => Err(AppError::ProviderInvalidResponse(
                "scripted provider has no answer left".to_string(),
            )),
        }
    }
}

// ── Config and state ──────────────────────────────────────────────────────────

pub fn config_with(pairs: &[(&str, &str)]) -> AppConfig {
    let pairs: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    AppConfig::from_lookup(move |key| {
        if key == "GOOGLE_API_KEY" {
            return Some("test-google-key".to_string());
        }
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .expect("test config")
}

pub fn test_config() -> AppConfig {
    config_with(&[])
}

pub fn test_state(provider: Arc<ScriptedProvider>) -> AppState {
    AppState::new(test_config(), provider)
}

// ── Model answers ─────────────────────────────────────────────────────────────

pub const LEASE_TEXT: &str = "On 2023-01-05, Party A signed the lease with Party B.";

pub fn lease_extraction_answer() -> String {
    serde_json::json!({
        "summary": "Lease agreement between Party A and Party B.",
        "events": [{
            "event": "Party A signed the lease with Party B",
            "date": "2023-01-05",
            "parties": ["Party A", "Party B"],
            "source": "lease.pdf"
        }]
    })
    .to_string()
}

pub fn lease_reasoning_answer() -> String {
    serde_json::json!({
        "events": [{
            "date": "2023-01-05",
            "description": "Party A signed the lease with Party B",
            "parties": ["Party A", "Party B", "party b"],
            "source_document": "lease.pdf",
            "ai_observations": "Start of the tenancy at the centre of the dispute."
        }],
        "key_observations": ["The lease is the only dated agreement."],
        "potential_gaps": [],
        "recommendations": []
    })
    .to_string()
}

// ── PDF fixtures ──────────────────────────────────────────────────────────────

/// Builds a one-page PDF with a Helvetica text layer. An empty `text` gives a
/// page with no text at all, like a scan without OCR.
pub fn make_test_pdf(text: &str) -> Vec<u8> {
    use lopdf::dictionary;
    use lopdf::{Document, Object, Stream};

    let mut doc = Document::with_version("1.4");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let content = if text.is_empty() {
        String::new()
    } else {
        format!("BT /F1 12 Tf 72 700 Td ({text}) Tj ET")
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

    let resources = dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    };

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => resources,
    });

    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    });

    if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
        dict.set("Parent", pages_id);
    }

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("save pdf");
    buf
}

// ── Multipart bodies ──────────────────────────────────────────────────────────

pub const BOUNDARY: &str = "chronology-test-boundary";

pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub body: Vec<u8>,
}

impl<'a> Part<'a> {
    pub fn file(filename: &'a str, content_type: &'a str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            name: "files",
            filename: Some(filename),
            content_type: Some(content_type),
            body: body.into(),
        }
    }

    pub fn text(name: &'a str, value: &str) -> Self {
        Self {
            name,
            filename: None,
            content_type: None,
            body: value.as_bytes().to_vec(),
        }
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{filename}\"\r\n",
                    part.name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name).as_bytes(),
            ),
        }
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(&part.body);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}
