//! Prompt assembly: system prompt (from a skill file when available) and the
//! user message that carries the serialized trend list.
use std::path::Path;

use chrono::NaiveDate;
use trendreport_common::{ReportError, Result};
use trendreport_social::weibo::TrendItem;

/// Only the top topics are sent to the model.
pub const MAX_PROMPT_TRENDS: usize = 20;

/// Used when no skill file is configured or it cannot be read.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a senior social-media analyst and product strategist who specialises in Weibo hot-search trends.

Your role:
- Group the trending topics into themes (society, technology, entertainment, economy, sports, other)
- Explain why each notable topic is trending and what public sentiment it reflects
- For every topic, propose at least one creative product idea that rides the trend
- Score each product idea from 0 to 100: Interest carries 80% of the score, Utility 20%
- Keep the analysis factual; do not invent events that the titles do not support

Output:
- A single, self-contained HTML document with inline CSS and no external scripts
- A short executive summary, a ranked table of topics with their heat, and one card per
  product idea showing the Interest, Utility and weighted total scores"#;

/// Both halves of the completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPrompt {
    pub system: String,
    pub user: String,
}

impl ReportPrompt {
    pub fn new(system: impl Into<String>, trends: &[TrendItem], date: NaiveDate) -> Result<Self> {
        Ok(Self {
            system: system.into(),
            user: build_user_prompt(trends, date)?,
        })
    }
}

/// Read the skill file at `path`, falling back to [`DEFAULT_SYSTEM_PROMPT`].
pub fn load_system_prompt(path: Option<&Path>) -> String {
    let Some(path) = path else {
        return DEFAULT_SYSTEM_PROMPT.to_string();
    };
    match std::fs::read_to_string(path) {
        Ok(raw) => {
            let body = strip_front_matter(&raw).trim();
            if body.is_empty() {
                tracing::warn!(path = %path.display(), "prompt.skill.empty, using built-in prompt");
                return DEFAULT_SYSTEM_PROMPT.to_string();
            }
            tracing::info!(path = %path.display(), chars = body.chars().count(), "prompt.skill.loaded");
            body.to_string()
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "prompt.skill.unreadable, using built-in prompt"
            );
            DEFAULT_SYSTEM_PROMPT.to_string()
        }
    }
}

/// Drop a leading `---` YAML block if present.
pub fn strip_front_matter(text: &str) -> &str {
    let trimmed = text.trim_start_matches('\u{feff}');
    let Some(rest) = trimmed
        .strip_prefix("---\n")
        .or_else(|| trimmed.strip_prefix("---\r\n"))
    else {
        return text;
    };
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        if line.trim_end() == "---" {
            return &rest[offset..];
        }
    }
    text
}

/// User message for `date`; only the first [`MAX_PROMPT_TRENDS`] items are embedded.
pub fn build_user_prompt(trends: &[TrendItem], date: NaiveDate) -> Result<String> {
    let sent = &trends[..trends.len().min(MAX_PROMPT_TRENDS)];
    let data =
        serde_json::to_string_pretty(sent).map_err(|e| ReportError::Serialize(e.to_string()))?;

    Ok(format!(
        "Date: {date}\n\
         Below are today's Weibo hot-search topics as JSON \
         (title, heat = search volume, rank = 1-based position):\n\n\
         ```json\n{data}\n```\n\n\
         Write a trend analysis report for {date}.\n\
         For each topic give a product idea and score it: \
         total = Interest x 0.8 + Utility x 0.2, each on a 0-100 scale. \
         Rank the ideas by total score.\n\
         Formatting requirements:\n\
         - Reply with ONE complete HTML document that starts with <!DOCTYPE html> and ends with </html>\n\
         - Wrap the document in a ```html fenced code block\n\
         - Use inline CSS only; no external scripts, fonts or images\n\
         - Write the report in Simplified Chinese\n",
        date = date.format("%Y-%m-%d"),
    ))
}
