use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use trendreport_http::HttpError;

/// One ranked hot-search topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendItem {
    pub title: String,
    pub heat: u64,
    /// 1-based.
    pub rank: u32,
}

impl TrendItem {
    pub fn new(title: impl Into<String>, heat: u64, rank: u32) -> Self {
        Self {
            title: title.into(),
            heat,
            rank,
        }
    }
}

/// Why a fetch produced no items.
#[derive(Debug, thiserror::Error)]
pub enum TrendError {
    #[error("invalid trend endpoint: {0}")]
    Endpoint(String),

    #[error("trend request failed: {0}")]
    Transport(#[from] HttpError),

    #[error("trend endpoint returned status {status}: {body_snippet}")]
    Status { status: u16, body_snippet: String },

    #[error("malformed trend payload: {reason}, body_snippet: {body_snippet}")]
    Parse {
        reason: String,
        body_snippet: String,
    },

    #[error("trend source reported code {code}")]
    Upstream { code: i64 },

    #[error("unrecognized trend payload shape (top-level keys: {keys:?})")]
    UnrecognizedShape { keys: Vec<String> },
}

/// Shape A entry: `{ "hotword": "...", "hotwordnum": 123 }`, or `title` in place of `hotword`.
#[derive(Debug, Clone, Deserialize)]
pub struct HotWordEntry {
    #[serde(default, alias = "hot_word", alias = "hotWord")]
    pub hotword: Option<String>,
    /// Used when `hotword` is absent.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(
        default,
        alias = "hot_word_num",
        alias = "hotWordNum",
        deserialize_with = "lenient_count"
    )]
    pub hotwordnum: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub rank: Option<i64>,
}

/// Shape B entry (Weibo `data.realtime`): `{ "word": "...", "note": "...", "num": 123, "rank": 1 }`.
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeEntry {
    #[serde(default)]
    pub word: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub num: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub rank: Option<i64>,
}

/// Accepts numbers and numeric strings (" 12345"); anything else counts as absent.
fn lenient_count<'de, D>(de: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(de)?;
    Ok(match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hotword_entry_accepts_aliases_and_string_counts() {
        let e: HotWordEntry =
            serde_json::from_value(json!({"hotWord": "话题", "hotWordNum": " 4521"})).unwrap();
        assert_eq!(e.hotword.as_deref(), Some("话题"));
        assert_eq!(e.hotwordnum, Some(4521));
        assert_eq!(e.rank, None);
    }

    #[test]
    fn non_numeric_counts_are_absent() {
        let e: RealtimeEntry =
            serde_json::from_value(json!({"word": "x", "num": "hot", "rank": null})).unwrap();
        assert_eq!(e.num, None);
        assert_eq!(e.rank, None);
    }
}
