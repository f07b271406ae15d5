use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use trendreport_common::observability::{LogConfig, LogFormat, init_logging};
use trendreport_config::{ReportConfig, ReportConfigLoader};

use pipeline::Outcome;
mod pipeline;
mod report;

/// Fetch Weibo hot-search topics and have an LLM write an HTML trend report.
#[derive(Debug, Parser)]
#[command(name = "weibo-trend-report", version)]
struct Cli {
    /// YAML config file; skipped when it does not exist.
    #[arg(long, short, env = "TREND_REPORT_CONFIG", default_value = "trend-report.yaml")]
    config: PathBuf,

    /// Directory the report is written to.
    #[arg(long, short)]
    output_dir: Option<PathBuf>,

    /// Markdown skill file holding the analyst system prompt.
    #[arg(long)]
    skill: Option<PathBuf>,

    /// Emit JSON log lines instead of text.
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn load_config(&self) -> Result<ReportConfig, trendreport_config::ConfigLoadError> {
        let mut loader = ReportConfigLoader::new().with_optional_file(&self.config);
        if let Some(dir) = &self.output_dir {
            loader = loader.with_override("output_dir", dir.to_string_lossy());
        }
        if let Some(skill) = &self.skill {
            loader = loader.with_override("skill_path", skill.to_string_lossy());
        }
        loader.load()
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = init_logging(LogConfig {
        format: if cli.json_logs {
            LogFormat::Json
        } else {
            LogFormat::Text
        },
        ..LogConfig::default()
    })?;
    tracing::debug!(log_file = %log_path.display(), "logging.ready");

    let cfg = cli.load_config().inspect_err(|e| {
        tracing::error!(error = %e, "config.invalid");
    })?;

    match pipeline::run(&cfg).await {
        Ok(Outcome::Written(path)) => {
            tracing::info!(path = %path.display(), "report.done");
            Ok(())
        }
        Ok(Outcome::NoReport) => {
            tracing::info!("report.skipped: no HTML document in the model reply");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "run.failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_parse() {
        let cli = Cli::try_parse_from([
            "weibo-trend-report",
            "--output-dir",
            "out",
            "--skill",
            "SKILL.md",
            "--json-logs",
        ])
        .unwrap();
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        assert_eq!(cli.skill, Some(PathBuf::from("SKILL.md")));
        assert!(cli.json_logs);
    }

    #[test]
    fn cli_asserts() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
