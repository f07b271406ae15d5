//! Shape detection and normalisation of hot-search payloads.
//!
//! Two upstream shapes are understood:
//!
//! - **Hot-word list**: `{ "code": 200, "data": [ { "hotword", "hotwordnum" } ] }`
//!   (the list may also live under `result.list`).
//! - **Realtime list**: `{ "data": { "realtime": [ { "word", "note", "num", "rank" } ] } }`.
//!
//! Anything else is reported as [`TrendError::UnrecognizedShape`].
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::types::{HotWordEntry, RealtimeEntry, TrendError, TrendItem};

const SUCCESS_CODE: i64 = 200;

/// Which payload layout a response used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendShape {
    HotWordList,
    Realtime,
}

impl TrendShape {
    pub fn as_str(self) -> &'static str {
        match self {
            TrendShape::HotWordList => "hot_word_list",
            TrendShape::Realtime => "realtime",
        }
    }
}

/// Locate the item list and report which shape it belongs to.
pub fn detect_shape(payload: &Value) -> Option<(TrendShape, &Value)> {
    if payload.get("code").is_some_and(Value::is_number) {
        let list = payload
            .get("data")
            .filter(|d| d.is_array())
            .or_else(|| payload.pointer("/result/list").filter(|l| l.is_array()));
        if let Some(list) = list {
            return Some((TrendShape::HotWordList, list));
        }
    }

    payload
        .pointer("/data/realtime")
        .filter(|l| l.is_array())
        .map(|list| (TrendShape::Realtime, list))
}

/// Normalise a decoded payload into ranked items.
pub fn normalize(payload: &Value) -> Result<(TrendShape, Vec<TrendItem>), TrendError> {
    let Some((shape, list)) = detect_shape(payload) else {
        let keys = payload
            .as_object()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default();
        return Err(TrendError::UnrecognizedShape { keys });
    };

    let items = match shape {
        TrendShape::HotWordList => {
            let code = payload.get("code").and_then(Value::as_i64).unwrap_or(0);
            if code != SUCCESS_CODE {
                return Err(TrendError::Upstream { code });
            }
            let entries: Vec<HotWordEntry> = decode_entries(list)?;
            collect_ranked(
                entries
                    .into_iter()
                    .map(|e| (e.hotword.or(e.title), e.hotwordnum, e.rank)),
            )
        }
        TrendShape::Realtime => {
            let entries: Vec<RealtimeEntry> = decode_entries(list)?;
            collect_ranked(
                entries
                    .into_iter()
                    .map(|e| (e.word.or(e.note), e.num, e.rank)),
            )
        }
    };

    Ok((shape, items))
}

fn decode_entries<T: DeserializeOwned>(list: &Value) -> Result<Vec<T>, TrendError> {
    serde_json::from_value(list.clone()).map_err(|e| TrendError::Parse {
        reason: e.to_string(),
        body_snippet: snippet(list),
    })
}

/// How source ranks map onto 1-based ranks; chosen once per list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RankMode {
    /// Every entry carries a rank ≥ 1.
    Supplied,
    /// Every entry carries a rank and the smallest is 0.
    ZeroBased,
    /// Ranks are missing or negative somewhere; use list positions.
    Position,
}

fn rank_mode(ranks: impl Iterator<Item = Option<i64>>) -> RankMode {
    let mut min = None::<i64>;
    for rank in ranks {
        let Some(r) = rank else {
            return RankMode::Position;
        };
        min = Some(min.map_or(r, |m| m.min(r)));
    }
    match min {
        Some(m) if m >= 1 => RankMode::Supplied,
        Some(0) => RankMode::ZeroBased,
        _ => RankMode::Position,
    }
}

fn collect_ranked<I>(entries: I) -> Vec<TrendItem>
where
    I: Iterator<Item = (Option<String>, Option<i64>, Option<i64>)>,
{
    let entries: Vec<_> = entries.collect();
    let mode = rank_mode(entries.iter().map(|(_, _, rank)| *rank));

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, (title, heat, rank))| {
            let title = title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
            Some(TrendItem {
                title,
                heat: heat.map(|h| h.max(0) as u64).unwrap_or(0),
                rank: assign_rank(mode, rank, idx),
            })
        })
        .collect()
}

fn assign_rank(mode: RankMode, supplied: Option<i64>, position: usize) -> u32 {
    let one_based = match (mode, supplied) {
        (RankMode::Supplied, Some(r)) => r,
        (RankMode::ZeroBased, Some(r)) => r.saturating_add(1),
        _ => i64::try_from(position).unwrap_or(i64::MAX).saturating_add(1),
    };
    u32::try_from(one_based).unwrap_or(u32::MAX)
}

fn snippet(v: &Value) -> String {
    let s = v.to_string();
    match s.char_indices().nth(200) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hot_word_list_ranks_by_position_when_rank_missing() {
        let payload = json!({
            "code": 200,
            "msg": "success",
            "data": [
                {"hotword": "第一", "hotwordnum": 900},
                {"hotword": "第二", "hotwordnum": 800},
                {"hotword": "第三", "hotwordnum": 700}
            ]
        });
        let (shape, items) = normalize(&payload).unwrap();
        assert_eq!(shape, TrendShape::HotWordList);
        let ranks: Vec<u32> = items.iter().map(|i| i.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(items[0], TrendItem::new("第一", 900, 1));
    }

    #[test]
    fn hot_word_list_under_result_list() {
        let payload = json!({
            "code": 200,
            "result": {"list": [{"hotword": "话题", "hotwordnum": "12"}]}
        });
        let (_, items) = normalize(&payload).unwrap();
        assert_eq!(items, vec![TrendItem::new("话题", 12, 1)]);
    }

    #[test]
    fn missing_heat_defaults_to_zero() {
        let payload = json!({"code": 200, "data": [{"hotword": "无热度"}]});
        let (_, items) = normalize(&payload).unwrap();
        assert_eq!(items[0].heat, 0);
    }

    #[test]
    fn non_success_code_is_upstream_error() {
        let payload = json!({"code": 250, "data": []});
        assert!(matches!(
            normalize(&payload),
            Err(TrendError::Upstream { code: 250 })
        ));
    }

    #[test]
    fn realtime_uses_word_then_note_and_positions_when_a_rank_is_missing() {
        let payload = json!({
            "ok": 1,
            "data": {"realtime": [
                {"word": "甲", "num": 5000, "rank": 3},
                {"note": "乙", "num": 4000},
                {"word": "丙", "rank": 0}
            ]}
        });
        let (shape, items) = normalize(&payload).unwrap();
        assert_eq!(shape, TrendShape::Realtime);
        assert_eq!(
            items,
            vec![
                TrendItem::new("甲", 5000, 1),
                TrendItem::new("乙", 4000, 2),
                TrendItem::new("丙", 0, 3),
            ]
        );
    }

    #[test]
    fn zero_based_realtime_ranks_shift_to_distinct_one_based() {
        let payload = json!({"data": {"realtime": [
            {"word": "a", "rank": 0},
            {"word": "b", "rank": 1},
            {"word": "c", "rank": 2}
        ]}});
        let (_, items) = normalize(&payload).unwrap();
        let ranks: Vec<u32> = items.iter().map(|i| i.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn one_based_supplied_ranks_are_kept() {
        let payload = json!({"data": {"realtime": [
            {"word": "a", "rank": 2},
            {"word": "b", "rank": 5}
        ]}});
        let (_, items) = normalize(&payload).unwrap();
        let ranks: Vec<u32> = items.iter().map(|i| i.rank).collect();
        assert_eq!(ranks, vec![2, 5]);
    }

    #[test]
    fn negative_rank_anywhere_falls_back_to_positions() {
        let payload = json!({"data": {"realtime": [
            {"word": "a", "rank": 4},
            {"word": "b", "rank": -1}
        ]}});
        let (_, items) = normalize(&payload).unwrap();
        let ranks: Vec<u32> = items.iter().map(|i| i.rank).collect();
        assert_eq!(ranks, vec![1, 2]);
    }

    #[test]
    fn hot_word_entry_falls_back_to_title() {
        let payload = json!({
            "code": 200,
            "result": {"list": [{"title": "有标题无热词", "hotwordnum": "100"}]}
        });
        let (_, items) = normalize(&payload).unwrap();
        assert_eq!(items, vec![TrendItem::new("有标题无热词", 100, 1)]);
    }

    #[test]
    fn blank_titles_are_skipped_but_keep_their_slot() {
        let payload = json!({
            "code": 200,
            "data": [{"hotword": "  "}, {"hotword": "有效", "hotwordnum": 1}]
        });
        let (_, items) = normalize(&payload).unwrap();
        assert_eq!(items, vec![TrendItem::new("有效", 1, 2)]);
    }

    #[test]
    fn negative_heat_clamps_to_zero() {
        let payload = json!({"data": {"realtime": [{"word": "x", "num": -5}]}});
        let (_, items) = normalize(&payload).unwrap();
        assert_eq!(items[0].heat, 0);
    }

    #[test]
    fn unknown_shape_reports_keys() {
        let payload = json!({"status": "ok", "items": []});
        match normalize(&payload) {
            Err(TrendError::UnrecognizedShape { keys }) => {
                assert!(keys.contains(&"items".to_string()));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn non_object_entries_are_parse_errors() {
        let payload = json!({"code": 200, "data": ["just a string"]});
        assert!(matches!(normalize(&payload), Err(TrendError::Parse { .. })));
    }
}
