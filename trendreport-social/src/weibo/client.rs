//! Thin wrapper around the hot-search endpoint with browser-like defaults.
//!
//! One GET, no retries. [`WeiboTrends::try_fetch`] reports why nothing came
//! back; [`WeiboTrends::fetch`] logs that reason and resolves it to an empty
//! list so the caller can apply the fallback dataset.
use std::time::Duration;

use serde_json::Value;
use trendreport_http::header::{ACCEPT, HeaderMap, HeaderValue, REFERER, USER_AGENT};
use trendreport_http::{HttpClient, RequestOpts};

use super::normalize::normalize;
use super::types::{TrendError, TrendItem};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const WEIBO_REFERER: &str = "https://weibo.com/";

#[derive(Clone)]
pub struct WeiboTrends {
    http: HttpClient,
    endpoint: String,
}

impl WeiboTrends {
    /// Anchor a client to `endpoint`; a malformed URL is a construction error.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, TrendError> {
        let http = HttpClient::new(endpoint)
            .map_err(|e| TrendError::Endpoint(e.to_string()))?
            .with_timeout(timeout);
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
        })
    }

    fn browser_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(REFERER, HeaderValue::from_static(WEIBO_REFERER));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers
    }

    /// Fetch and normalise, surfacing the failure detail.
    pub async fn try_fetch(&self) -> Result<Vec<TrendItem>, TrendError> {
        let raw = self
            .http
            .get_raw(
                &self.endpoint,
                RequestOpts {
                    headers: Some(Self::browser_headers()),
                    allow_absolute: true,
                    ..Default::default()
                },
            )
            .await?;

        if raw.status.as_u16() != 200 {
            return Err(TrendError::Status {
                status: raw.status.as_u16(),
                body_snippet: raw.snippet(),
            });
        }

        let payload: Value = serde_json::from_slice(&raw.body).map_err(|e| TrendError::Parse {
            reason: e.to_string(),
            body_snippet: raw.snippet(),
        })?;

        let (shape, items) = normalize(&payload)?;
        tracing::info!(
            target: "social.weibo",
            shape = shape.as_str(),
            count = items.len(),
            "weibo.trends.fetched"
        );
        Ok(items)
    }

    /// Fetch, logging and swallowing any failure as an empty list.
    pub async fn fetch(&self) -> Vec<TrendItem> {
        match self.try_fetch().await {
            Ok(items) => items,
            Err(err) => {
                log_failure(&self.endpoint, &err);
                Vec::new()
            }
        }
    }
}

/// One-shot fetch against `endpoint`; never fails, including on a bad URL.
pub async fn fetch_trends(endpoint: &str, timeout: Duration) -> Vec<TrendItem> {
    match WeiboTrends::new(endpoint, timeout) {
        Ok(client) => client.fetch().await,
        Err(err) => {
            log_failure(endpoint, &err);
            Vec::new()
        }
    }
}

fn log_failure(endpoint: &str, err: &TrendError) {
    match err {
        TrendError::Status {
            status,
            body_snippet,
        } => tracing::warn!(
            target: "social.weibo",
            endpoint,
            status,
            body_snippet = %body_snippet,
            "weibo.trends.bad_status"
        ),
        TrendError::Parse {
            reason,
            body_snippet,
        } => tracing::warn!(
            target: "social.weibo",
            endpoint,
            reason = %reason,
            body_snippet = %body_snippet,
            "weibo.trends.parse_error"
        ),
        other => tracing::warn!(
            target: "social.weibo",
            endpoint,
            error = %other,
            "weibo.trends.fetch_failed"
        ),
    }
}
