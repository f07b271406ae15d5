use crate::traits::{LlmClient, LlmResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use trendreport_common::{ReportError, Result};
use trendreport_http::header::{HeaderMap, HeaderName, HeaderValue};
use trendreport_http::{secret_header_value, Auth, HttpClient, HttpError, RequestOpts};

pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MAX_TOKENS: u32 = 8192;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const MESSAGES_PATH: &str = "v1/messages";

/// Client for the Anthropic Messages API.
pub struct AnthropicClient {
    client: HttpClient,
    api_key: HeaderValue,
    model: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One typed block of the reply `content` list.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: Option<u32>,
    #[serde(default)]
    pub output_tokens: Option<u32>,
}

impl MessagesResponse {
    /// Text blocks joined in order with `\n`; non-text blocks are skipped.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn tokens_used(&self) -> Option<u32> {
        let usage = self.usage.as_ref()?;
        match (usage.input_tokens, usage.output_tokens) {
            (None, None) => None,
            (i, o) => Some(i.unwrap_or(0).saturating_add(o.unwrap_or(0))),
        }
    }
}

impl AnthropicClient {
    /// Create a client for `base_url` (e.g. [`ANTHROPIC_API_BASE`] or a gateway).
    pub fn new(api_key: &str, base_url: &str, model: String) -> Result<Self> {
        let base = format!("{}/", base_url.trim_end_matches('/'));
        let client = HttpClient::new(&base)
            .map_err(|e| ReportError::Config(format!("invalid API base URL: {e}")))?
            .with_timeout(DEFAULT_TIMEOUT);
        let api_key = secret_header_value(api_key)
            .map_err(|e| ReportError::Config(format!("unusable API key: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model,
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }

    /// Budget used when a call does not pass its own `max_tokens`.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn version_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("anthropic-version"),
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let req = MessagesRequest {
            model: &self.model,
            max_tokens: max_tokens.unwrap_or(self.max_tokens),
            system: system_prompt,
            messages: vec![WireMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
        };

        tracing::debug!(model = %self.model, max_tokens = req.max_tokens, "anthropic.messages.request");

        let resp: MessagesResponse = self
            .client
            .post_json_opts(
                MESSAGES_PATH,
                &req,
                RequestOpts {
                    auth: Auth::Header {
                        name: HeaderName::from_static("x-api-key"),
                        value: self.api_key.clone(),
                    },
                    headers: Some(Self::version_headers()),
                    ..Default::default()
                },
            )
            .await
            .map_err(http_to_report)?;

        tracing::debug!(
            id = ?resp.id,
            stop_reason = ?resp.stop_reason,
            blocks = resp.content.len(),
            "anthropic.messages.response"
        );

        Ok(LlmResponse {
            text: resp.joined_text(),
            tokens_used: resp.tokens_used(),
            model: resp.model.clone().or_else(|| Some(self.model.clone())),
            stop_reason: resp.stop_reason,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        match self
            .generate("Respond with just 'OK'", None, Some(5), Some(0.0))
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Anthropic health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

fn http_to_report(e: HttpError) -> ReportError {
    ReportError::Completion(format!("{e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_messages_api_shape() {
        let req = MessagesRequest {
            model: "claude-test",
            max_tokens: 100,
            system: Some("sys"),
            messages: vec![WireMessage {
                role: "user",
                content: "hi",
            }],
            temperature: None,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            json!({
                "model": "claude-test",
                "max_tokens": 100,
                "system": "sys",
                "messages": [{"role": "user", "content": "hi"}]
            })
        );
    }

    #[test]
    fn text_blocks_join_in_order_and_skip_others() {
        let resp: MessagesResponse = serde_json::from_value(json!({
            "id": "msg_1",
            "content": [
                {"type": "text", "text": "```html"},
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "<!DOCTYPE html></html>\n```"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }))
        .unwrap();
        assert_eq!(resp.joined_text(), "```html\n<!DOCTYPE html></html>\n```");
        assert_eq!(resp.tokens_used(), Some(15));
    }

    #[test]
    fn trailing_slash_in_base_is_tolerated() {
        assert!(AnthropicClient::new("k", "https://gateway.example/anthropic/", "m".into()).is_ok());
        assert!(AnthropicClient::new("k", "not a url", "m".into()).is_err());
    }
}
