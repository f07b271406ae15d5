use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use trendreport_common::Result;

use crate::prompt::ReportPrompt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Text blocks of the reply, concatenated in order.
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
    pub stop_reason: Option<String>,
}

impl LlmResponse {
    /// True when the provider stopped because the token budget ran out.
    pub fn is_truncated(&self) -> bool {
        self.stop_reason.as_deref() == Some("max_tokens")
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response to the given prompt with optional system prompt
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse>;

    /// Check if the LLM service is available
    async fn health_check(&self) -> Result<bool>;

    /// Get the model name being used
    fn model_name(&self) -> &str;

    /// Ask the model for the HTML trend report described by `prompt`.
    async fn write_report(&self, prompt: &ReportPrompt) -> Result<LlmResponse> {
        tracing::info!(
            model = self.model_name(),
            prompt_chars = prompt.user.chars().count(),
            "llm.report.request"
        );
        let response = self
            .generate(&prompt.user, Some(&prompt.system), None, None)
            .await?;
        if response.is_truncated() {
            tracing::warn!(
                model = self.model_name(),
                "llm.report.truncated: hit max_tokens, the HTML may be incomplete"
            );
        }
        tracing::debug!(
            response_chars = response.text.chars().count(),
            tokens_used = ?response.tokens_used,
            "llm.report.response"
        );
        Ok(response)
    }
}
