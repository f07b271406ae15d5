//! `tracing` setup shared by the binary and the integration tests.
//!
//! Every run appends to a daily rolling file (`<app_name>.log.<YYYY-MM-DD>`)
//! and, unless disabled, mirrors the same events to `stderr`. Only the first
//! call to [`init_logging`] installs a subscriber; later calls return the path
//! chosen by the first.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use chrono::Local;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Overrides the log directory when [`LogConfig::log_dir`] is unset.
pub const LOG_DIR_ENV: &str = "TREND_REPORT_LOG_DIR";

static INSTALLED: OnceLock<(PathBuf, WorkerGuard)> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// File stem and default directory name.
    pub app_name: &'static str,
    /// Falls back to `$TREND_REPORT_LOG_DIR`, then `~/.local/share/<app_name>`.
    pub log_dir: Option<PathBuf>,
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Directive used when `RUST_LOG` is unset or unparsable.
    pub default_filter: &'static str,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "weibo-trend-report",
            log_dir: None,
            emit_stderr: true,
            format: LogFormat::default(),
            default_filter: "info",
        }
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber and return today's log file path.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some((path, _)) = INSTALLED.get() {
        return Ok(path.clone());
    }

    let dir = resolve_log_dir(
        config.app_name,
        config.log_dir.as_deref(),
        std::env::var_os(LOG_DIR_ENV).map(PathBuf::from),
    );
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;

    let stem = format!("{}.log", config.app_name);
    let path = dir.join(format!("{stem}.{}", Local::now().format("%Y-%m-%d")));
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&dir, &stem));

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_filter));

    tracing_subscriber::registry()
        .with(build_layers(config.format, file_writer, config.emit_stderr))
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;

    let _ = INSTALLED.set((path.clone(), guard));
    Ok(path)
}

fn build_layers(format: LogFormat, file: NonBlocking, stderr: bool) -> Vec<BoxedLayer> {
    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);
    match format {
        LogFormat::Text => {
            layers.push(fmt::layer().with_ansi(false).with_writer(file).boxed());
            if stderr {
                layers.push(fmt::layer().with_target(false).with_writer(std::io::stderr).boxed());
            }
        }
        LogFormat::Json => {
            layers.push(fmt::layer().json().with_writer(file).boxed());
            if stderr {
                layers.push(fmt::layer().json().with_writer(std::io::stderr).boxed());
            }
        }
    }
    layers
}

fn resolve_log_dir(app_name: &str, explicit: Option<&Path>, from_env: Option<PathBuf>) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    if let Some(dir) = explicit.map(Path::to_path_buf).or(from_env) {
        return expand_home(&dir, home.as_deref());
    }
    match home {
        Some(home) => home.join(".local/share").join(app_name),
        None => PathBuf::from(app_name),
    }
}

fn expand_home(path: &Path, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
