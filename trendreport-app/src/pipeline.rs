//! One end-to-end run: trends in, HTML report file out.
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use trendreport_config::ReportConfig;
use trendreport_llm::extract::{extract_report, response_edges};
use trendreport_llm::prompt::{ReportPrompt, load_system_prompt};
use trendreport_llm::traits::LlmClient;
use trendreport_llm::{LlmSettings, ensure_llm_ready};
use trendreport_social::weibo::{fetch_trends, with_fallback};

use crate::report::{report_date, write_report};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The report was accepted and saved here.
    Written(PathBuf),
    /// The reply contained no HTML document; nothing was written.
    NoReport,
}

fn llm_settings(cfg: &ReportConfig) -> LlmSettings {
    LlmSettings {
        api_key: cfg.api_key.clone(),
        base_url: cfg.api_base_url.clone(),
        model: cfg.model.clone(),
        max_tokens: cfg.max_tokens,
        timeout: cfg.completion_timeout,
    }
}

pub async fn run(cfg: &ReportConfig) -> Result<Outcome> {
    let llm = ensure_llm_ready(&llm_settings(cfg)).context("building completion client")?;
    run_with(cfg, llm, report_date(Utc::now())).await
}

pub async fn run_with(
    cfg: &ReportConfig,
    llm: Arc<dyn LlmClient + Send + Sync>,
    date: NaiveDate,
) -> Result<Outcome> {
    tracing::info!(endpoint = %cfg.trend_endpoint, "trends.fetch.start");
    let trends = with_fallback(fetch_trends(&cfg.trend_endpoint, cfg.fetch_timeout).await);
    tracing::info!(count = trends.len(), "trends.ready");

    let system = load_system_prompt(cfg.skill_path.as_deref());
    let prompt = ReportPrompt::new(system, &trends, date).context("building report prompt")?;

    let response = llm
        .write_report(&prompt)
        .await
        .context("requesting report completion")?;

    let Some(report) = extract_report(&response.text) else {
        let (head, tail) = response_edges(&response.text);
        tracing::warn!(
            chars = response.text.chars().count(),
            head = %head,
            tail = %tail,
            "report.extract.failed: no HTML document in reply"
        );
        return Ok(Outcome::NoReport);
    };
    tracing::info!(strategy = report.strategy.as_str(), "report.extract.ok");

    let path = write_report(&cfg.output_dir, date, &report.html).with_context(|| {
        format!("writing report into {}", cfg.output_dir.display())
    })?;
    Ok(Outcome::Written(path))
}
