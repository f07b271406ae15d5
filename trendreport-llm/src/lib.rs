//! LLM integration for the trend report.
//!
//! This crate exposes the [`traits::LlmClient`] interface, the Anthropic
//! Messages API implementation, prompt assembly, and the extractor that pulls
//! the HTML report out of the model's free-text reply.
//!
//! # Examples
//! ```no_run
//! use trendreport_common::Result;
//! use trendreport_llm::{ensure_llm_ready, LlmSettings};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let settings = LlmSettings::new("sk-ant-...".to_string());
//! let client = ensure_llm_ready(&settings)?;
//! assert!(!client.model_name().is_empty());
//! # Ok(())
//! # }
//! ```
pub mod anthropic;
pub mod extract;
pub mod prompt;
pub mod traits;

use anthropic::AnthropicClient;
use std::sync::Arc;
use std::time::Duration;
use traits::LlmClient;

pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

/// What the completion client needs; built by the binary from its config.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl LlmSettings {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: anthropic::ANTHROPIC_API_BASE.to_string(),
            model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            max_tokens: anthropic::DEFAULT_MAX_TOKENS,
            timeout: anthropic::DEFAULT_TIMEOUT,
        }
    }
}

/// Build the completion client described by `settings`.
pub fn ensure_llm_ready(
    settings: &LlmSettings,
) -> trendreport_common::Result<Arc<dyn LlmClient + Send + Sync + 'static>> {
    let client = AnthropicClient::new(&settings.api_key, &settings.base_url, settings.model.clone())?
        .with_max_tokens(settings.max_tokens)
        .with_timeout(settings.timeout);
    tracing::debug!(
        model = %settings.model,
        base_url = %settings.base_url,
        "llm.client.ready"
    );
    Ok(Arc::new(client))
}
