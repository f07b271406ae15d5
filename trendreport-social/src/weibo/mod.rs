//! Weibo hot-search integration.
//!
//! Submodules provide the HTTP fetcher, the payload shape detection and
//! normalisation, the strongly typed wire models, and the fallback dataset.
pub mod client;
pub mod fallback;
pub mod normalize;
pub mod types;

pub use client::{WeiboTrends, fetch_trends};
pub use fallback::{fallback_trends, with_fallback};
pub use types::{TrendError, TrendItem};
