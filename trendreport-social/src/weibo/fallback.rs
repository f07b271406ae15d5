//! Fixed demo dataset substituted when the live fetch yields nothing.
use super::types::TrendItem;

/// `(title, heat)` in rank order.
pub const FALLBACK_TRENDS: [(&str, u64); 5] = [
    ("人工智能发展趋势", 5_000_000),
    ("新能源汽车市场", 4_500_000),
    ("远程办公工具", 4_000_000),
    ("健康生活方式", 3_500_000),
    ("在线教育平台", 3_000_000),
];

pub fn fallback_trends() -> Vec<TrendItem> {
    FALLBACK_TRENDS
        .iter()
        .zip(1u32..)
        .map(|((title, heat), rank)| TrendItem::new(*title, *heat, rank))
        .collect()
}

/// Caller policy: an empty fetch is replaced by [`fallback_trends`].
pub fn with_fallback(items: Vec<TrendItem>) -> Vec<TrendItem> {
    if items.is_empty() {
        tracing::warn!(
            target: "social.weibo",
            count = FALLBACK_TRENDS.len(),
            "weibo.trends.using_fallback"
        );
        return fallback_trends();
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fetch_becomes_the_five_fallback_items() {
        let effective = with_fallback(Vec::new());
        assert_eq!(effective.len(), 5);
        for (item, (idx, (title, heat))) in effective.iter().zip(FALLBACK_TRENDS.iter().enumerate()) {
            assert_eq!(item.title, *title);
            assert_eq!(item.heat, *heat);
            assert_eq!(item.rank as usize, idx + 1);
        }
    }

    #[test]
    fn fallback_dataset_is_fixed() {
        assert_eq!(
            fallback_trends(),
            vec![
                TrendItem::new("人工智能发展趋势", 5_000_000, 1),
                TrendItem::new("新能源汽车市场", 4_500_000, 2),
                TrendItem::new("远程办公工具", 4_000_000, 3),
                TrendItem::new("健康生活方式", 3_500_000, 4),
                TrendItem::new("在线教育平台", 3_000_000, 5),
            ]
        );
    }

    #[test]
    fn live_items_pass_through() {
        let live = vec![TrendItem::new("实时", 1, 1)];
        assert_eq!(with_fallback(live.clone()), live);
    }
}
