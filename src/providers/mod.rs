pub mod gemini;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::errors::AppResult;

#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system_instruction: String,
    pub prompt: String,
    pub temperature: f64,
    /// Ask the model for `application/json` instead of free text.
    pub json_output: bool,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub token_usage: Value,
}

/// Boundary to the hosted model. One call is one attempt; callers decide
/// what to do with retryable errors.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: &LlmRequest) -> AppResult<LlmResponse>;
}
