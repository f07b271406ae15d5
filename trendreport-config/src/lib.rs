//! Loader for the report configuration: built-in defaults, an optional YAML
//! file, `TREND_REPORT__*` overrides, and finally the well-known provider
//! variables (`ANTHROPIC_API_KEY`, `ANTHROPIC_BASE_URL`, `WEIBO_TREND_API`).
//! The older names `CLAUDE_API_KEY`, `CLAUDE_API_BASE` and `WEIBO_API_ENDPOINT`
//! are read when the primary name is unset.
//!
//! String values may reference other variables as `${VAR}`; they are expanded
//! after all sources are merged.
use config::{Config, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const API_BASE_URL_ENV: &str = "ANTHROPIC_BASE_URL";
pub const TREND_ENDPOINT_ENV: &str = "WEIBO_TREND_API";

pub const LEGACY_API_KEY_ENV: &str = "CLAUDE_API_KEY";
pub const LEGACY_API_BASE_URL_ENV: &str = "CLAUDE_API_BASE";
pub const LEGACY_TREND_ENDPOINT_ENV: &str = "WEIBO_API_ENDPOINT";

/// Config key, then the variables consulted for it in order.
const WELL_KNOWN_ENV: [(&str, [&str; 2]); 3] = [
    ("api_key", [API_KEY_ENV, LEGACY_API_KEY_ENV]),
    ("api_base_url", [API_BASE_URL_ENV, LEGACY_API_BASE_URL_ENV]),
    ("trend_endpoint", [TREND_ENDPOINT_ENV, LEGACY_TREND_ENDPOINT_ENV]),
];

pub const DEFAULT_API_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_TREND_ENDPOINT: &str = "https://weibo.com/ajax/side/hotSearch";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 8192;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("ANTHROPIC_API_KEY (or CLAUDE_API_KEY) is not set")]
    MissingApiKey,

    #[error(transparent)]
    Source(#[from] config::ConfigError),
}

/// Merged, validated configuration handed to every component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    pub api_key: String,
    pub api_base_url: String,
    pub trend_endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub output_dir: PathBuf,
    pub skill_path: Option<PathBuf>,
    pub fetch_timeout: Duration,
    pub completion_timeout: Duration,
}

/// Wire form before validation; the key may still be missing here.
#[derive(Debug, Deserialize)]
struct RawReportConfig {
    #[serde(default)]
    api_key: Option<String>,
    api_base_url: String,
    trend_endpoint: String,
    model: String,
    #[serde(deserialize_with = "number_or_string")]
    max_tokens: u32,
    output_dir: PathBuf,
    #[serde(default)]
    skill_path: Option<PathBuf>,
    #[serde(deserialize_with = "number_or_string")]
    fetch_timeout_secs: u64,
    #[serde(deserialize_with = "number_or_string")]
    completion_timeout_secs: u64,
}

/// Environment overlays arrive as strings; YAML numbers arrive as numbers.
fn number_or_string<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: std::str::FromStr + serde::de::DeserializeOwned,
    T::Err: std::fmt::Display,
{
    match Value::deserialize(de)? {
        Value::String(s) => s.trim().parse::<T>().map_err(serde::de::Error::custom),
        other => serde_json::from_value(other).map_err(serde::de::Error::custom),
    }
}

impl RawReportConfig {
    fn validate(self) -> Result<ReportConfig, ConfigLoadError> {
        let api_key = self
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && !k.contains("${"))
            .ok_or(ConfigLoadError::MissingApiKey)?;

        Ok(ReportConfig {
            api_key,
            api_base_url: self.api_base_url,
            trend_endpoint: self.trend_endpoint,
            model: self.model,
            max_tokens: self.max_tokens,
            output_dir: self.output_dir,
            skill_path: self
                .skill_path
                .filter(|p| !p.as_os_str().is_empty()),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            completion_timeout: Duration::from_secs(self.completion_timeout_secs),
        })
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (defaults + YAML + env overrides).
pub struct ReportConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    overrides: Vec<(&'static str, String)>,
}

impl Default for ReportConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportConfigLoader {
    /// Start with built-in defaults plus `TREND_REPORT__` env overrides.
    ///
    /// ```
    /// use trendreport_config::ReportConfigLoader;
    ///
    /// let config = ReportConfigLoader::new()
    ///     .with_yaml_str("api_key: 'sk-ant-doc'\nmodel: 'claude-doc'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.model, "claude-doc");
    /// assert_eq!(config.fetch_timeout.as_secs(), 10);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            overrides: Vec::new(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`with_file`](Self::with_file) but silently skipped when absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Highest-precedence value for `key` (used for CLI flags).
    pub fn with_override(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.overrides.push((key, value.into()));
        self
    }

    /// Consume the builder and produce a validated [`ReportConfig`].
    ///
    /// ```
    /// use trendreport_config::{ConfigLoadError, ReportConfigLoader};
    ///
    /// temp_env::with_vars_unset(["ANTHROPIC_API_KEY", "CLAUDE_API_KEY"], || {
    ///     let err = ReportConfigLoader::new().load().unwrap_err();
    ///     assert!(matches!(err, ConfigLoadError::MissingApiKey));
    /// });
    /// ```
    pub fn load(self) -> Result<ReportConfig, ConfigLoadError> {
        let mut builder = self
            .builder
            .add_source(Environment::with_prefix("TREND_REPORT").separator("__"))
            .set_default("api_base_url", DEFAULT_API_BASE_URL)?
            .set_default("trend_endpoint", DEFAULT_TREND_ENDPOINT)?
            .set_default("model", DEFAULT_MODEL)?
            .set_default("max_tokens", DEFAULT_MAX_TOKENS)?
            .set_default("output_dir", ".")?
            .set_default("fetch_timeout_secs", DEFAULT_FETCH_TIMEOUT_SECS)?
            .set_default("completion_timeout_secs", DEFAULT_COMPLETION_TIMEOUT_SECS)?;

        for (key, vars) in WELL_KNOWN_ENV {
            let value = vars
                .iter()
                .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()));
            builder = builder.set_override_option(key, value)?;
        }
        for (key, value) in self.overrides {
            builder = builder.set_override(key, value)?;
        }

        let cfg = builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let raw: RawReportConfig =
            serde_json::from_value(v).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        raw.validate()
    }
}
