//! Social platform clients used by the trend report.
//!
//! Only the Weibo hot-search pipeline is implemented: one GET against a
//! configurable endpoint, normalisation of the known payload shapes into
//! [`weibo::TrendItem`] records, and the fixed fallback dataset used when the
//! fetch comes back empty.
pub mod weibo;
