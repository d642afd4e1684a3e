use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::StatusCode;
use serde_json::Value;

use crate::core::config::{AppConfig, DEFAULT_GEMINI_BASE_URL};
use crate::core::errors::{AppError, AppResult};
use crate::providers::{LlmProvider, LlmRequest, LlmResponse};

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    model: String,
    api_key: String,
    base_url: String,
    relay: Option<RelaySettings>,
}

/// Monitoring relay that forwards to the real endpoint and records usage.
#[derive(Debug, Clone)]
struct RelaySettings {
    api_key: String,
    target_url: String,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.request_timeout_secs.min(15)))
            .build()
            .map_err(|err| AppError::Network(err.to_string()))?;

        let (base_url, relay) = match &config.helicone_api_key {
            Some(key) => (
                config.relay_base_url.clone(),
                Some(RelaySettings {
                    api_key: key.clone(),
                    target_url: if config.gemini_base_url.is_empty() {
                        DEFAULT_GEMINI_BASE_URL.to_string()
                    } else {
                        config.gemini_base_url.clone()
                    },
                }),
            ),
            None => (config.gemini_base_url.clone(), None),
        };

        Ok(Self {
            http,
            model: config.model.clone(),
            api_key: config.google_api_key.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
            relay,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn uses_relay(&self) -> bool {
        self.relay.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }

    fn payload(&self, request: &LlmRequest) -> Value {
        let mut generation_config = serde_json::json!({
            "temperature": request.temperature,
            "responseMimeType": if request.json_output { "application/json" } else { "text/plain" },
        });
        if self.model.starts_with("gemini-2.5") {
            generation_config["thinkingConfig"] = serde_json::json!({ "thinkingBudget": 0 });
        }
        serde_json::json!({
            "systemInstruction": {
                "parts": [{"text": request.system_instruction}]
            },
            "contents": [
                {
                    "role": "user",
                    "parts": [{"text": request.prompt}]
                }
            ],
            "generationConfig": generation_config
        })
    }

    async fn stream_generate(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let mut builder = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.payload(request));
        if let Some(relay) = &self.relay {
            builder = builder
                .header("helicone-auth", format!("Bearer {}", relay.api_key))
                .header("helicone-target-url", &relay.target_url);
        }

        let response = builder.send().await.map_err(map_transport_error)?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(AppError::ProviderAuth),
            StatusCode::TOO_MANY_REQUESTS => return Err(AppError::ProviderRateLimited),
            status if status.is_server_error() => {
                return Err(AppError::ProviderUnavailable(format!("status {status}")));
            }
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::ProviderInvalidResponse(format!(
                    "status {status} body {body}"
                )));
            }
            _ => {}
        }

        let mut collector = SseCollector::default();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_transport_error)?;
            collector.push(&chunk)?;
        }
        collector.finish()
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(
            model = %self.model,
            relay = self.relay.is_some(),
            prompt_chars = request.prompt.len(),
            "sending gemini request"
        );
        let response = self.stream_generate(request).await?;
        tracing::debug!(
            model = %self.model,
            response_chars = response.text.len(),
            "gemini stream complete"
        );
        Ok(response)
    }
}

fn map_transport_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::ProviderTimeout
    } else {
        AppError::Network(err.to_string())
    }
}

/// Buffers a server-sent-event stream until it completes. Each `data:` line
/// carries one JSON chunk of the response; text parts are concatenated in
/// arrival order and the last `usageMetadata` wins.
#[derive(Debug, Default)]
pub struct SseCollector {
    pending: Vec<u8>,
    text: String,
    token_usage: Option<Value>,
    chunks: usize,
}

impl SseCollector {
    pub fn push(&mut self, bytes: &[u8]) -> AppResult<()> {
        self.pending.extend_from_slice(bytes);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.handle_line(&line)?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> AppResult<LlmResponse> {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.handle_line(&line)?;
        }
        if self.chunks == 0 {
            return Err(AppError::ProviderInvalidResponse(
                "stream ended without any data chunks".to_string(),
            ));
        }
        Ok(LlmResponse {
            text: self.text.trim().to_string(),
            token_usage: self.token_usage.unwrap_or_else(|| serde_json::json!({})),
        })
    }

    fn handle_line(&mut self, raw: &[u8]) -> AppResult<()> {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();
        let Some(data) = line.strip_prefix("data:") else {
            return Ok(());
        };
        let data = data.trim();
        if data.is_empty() || data == "[DONE]" {
            return Ok(());
        }

        let chunk: Value = serde_json::from_str(data).map_err(|err| {
            AppError::ProviderInvalidResponse(format!("stream chunk not JSON: {err}"))
        })?;
        self.chunks += 1;

        if let Some(error) = chunk.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown provider error");
            return Err(AppError::ProviderInvalidResponse(message.to_string()));
        }
        if let Some(reason) = chunk
            .get("promptFeedback")
            .and_then(|feedback| feedback.get("blockReason"))
            .and_then(Value::as_str)
        {
            return Err(AppError::ProviderInvalidResponse(format!(
                "prompt blocked by provider: {reason}"
            )));
        }

        let parts = chunk
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|items: &Vec<Value>| items.first())
            .and_then(|item: &Value| item.get("content"))
            .and_then(|content: &Value| content.get("parts"))
            .and_then(Value::as_array);
        if let Some(parts) = parts {
            for part in parts {
                if part.get("thought").and_then(Value::as_bool).unwrap_or(false) {
                    continue;
                }
                if let Some(text) = part.get("text").and_then(Value::as_str) {
                    self.text.push_str(text);
                }
            }
        }

        if let Some(usage) = chunk.get("usageMetadata") {
            self.token_usage = Some(usage.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> String {
        format!(
            "data: {}\r\n\r\n",
            serde_json::json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
            })
        )
    }

    #[test]
    fn collector_joins_text_across_split_chunks() {
        let body = format!("{}{}", chunk("[{\"event\":"), chunk("\"Signed\"}]"));
        let (first, second) = body.as_bytes().split_at(17);

        let mut collector = SseCollector::default();
        collector.push(first).unwrap();
        collector.push(second).unwrap();
        let response = collector.finish().unwrap();

        assert_eq!(response.text, "[{\"event\":\"Signed\"}]");
    }

    #[test]
    fn collector_keeps_last_usage_metadata() {
        let body = format!(
            "data: {}\n\ndata: {}\n\n",
            serde_json::json!({"candidates": [{"content": {"parts": [{"text": "a"}]}}],
                "usageMetadata": {"promptTokenCount": 3}}),
            serde_json::json!({"candidates": [{"content": {"parts": [{"text": "b"}]}}],
                "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 9}})
        );
        let mut collector = SseCollector::default();
        collector.push(body.as_bytes()).unwrap();
        let response = collector.finish().unwrap();

        assert_eq!(response.text, "ab");
        assert_eq!(response.token_usage["candidatesTokenCount"], 9);
    }

    #[test]
    fn collector_surfaces_inline_errors() {
        let body = "data: {\"error\": {\"code\": 400, \"message\": \"bad request\"}}\n\n";
        let mut collector = SseCollector::default();
        let err = collector.push(body.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("bad request"));
    }

    #[test]
    fn empty_stream_is_invalid() {
        let collector = SseCollector::default();
        assert_eq!(
            collector.finish().unwrap_err().code(),
            "PROVIDER_INVALID_RESPONSE"
        );
    }

    #[test]
    fn thought_parts_are_skipped() {
        let body = format!(
            "data: {}\n",
            serde_json::json!({"candidates": [{"content": {"parts": [
                {"text": "thinking...", "thought": true},
                {"text": "answer"}
            ]}}]})
        );
        let mut collector = SseCollector::default();
        collector.push(body.as_bytes()).unwrap();
        assert_eq!(collector.finish().unwrap().text, "answer");
    }
}
