//! Thin `reqwest` wrapper used by the trend fetcher and the completion client.
//!
//! One attempt per call; the caller decides what a failure means. Secret
//! headers are redacted from every log line. Set `TREND_REPORT_HTTP_RAW=1` to
//! log a curl-style rendering of each request and the raw response body.
//!
//! ```no_run
//! # async fn demo() -> Result<(), trendreport_http::HttpError> {
//! let client = trendreport_http::HttpClient::new("https://weibo.com/")?;
//! let raw = client
//!     .get_raw("ajax/side/hotSearch", trendreport_http::RequestOpts::default())
//!     .await?;
//! println!("{} {}", raw.status, raw.snippet());
//! # Ok(()) }
//! ```

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;

pub use reqwest::header;

const RAW_ENV: &str = "TREND_REPORT_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;

const REDACTED: &str = "<redacted>";

fn raw_enabled() -> bool {
    std::env::var(RAW_ENV)
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn is_secret_header(name: &HeaderName, value: &HeaderValue) -> bool {
    value.is_sensitive()
        || matches!(
            name.as_str(),
            "authorization" | "x-api-key" | "cookie" | "proxy-authorization"
        )
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let shown = if is_secret_header(k, v) {
                REDACTED.to_string()
            } else {
                String::from_utf8_lossy(v.as_bytes()).into_owned()
            };
            (k.as_str().to_string(), shown)
        })
        .collect()
}

/// curl rendering of a request for `http.raw` logs; query strings are dropped.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap, body: Option<&[u8]>) -> String {
    let quote = |s: &str| format!("'{}'", s.replace('\'', r"'\''"));
    let mut shown = url.clone();
    shown.set_query(None);

    let mut out = format!("curl -X{method}");
    for (name, value) in redact_headers(headers) {
        out.push_str(&format!(" -H {}", quote(&format!("{name}: {value}"))));
    }
    match body.map(std::str::from_utf8) {
        Some(Ok(text)) => out.push_str(&format!(" -d {}", quote(&truncate_chars(text, RAW_MAX_BODY)))),
        Some(Err(_)) => out.push_str(" --data-binary @-"),
        None => {}
    }
    out.push_str(&format!(" {}", quote(shown.as_str())));
    out
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

/// How a request proves who it is.
#[derive(Clone, Debug, Default)]
pub enum Auth {
    /// A secret header such as Anthropic's `x-api-key`.
    Header { name: HeaderName, value: HeaderValue },
    #[default]
    None,
}

impl Auth {
    fn kind(&self) -> &'static str {
        match self {
            Auth::Header { .. } => "header",
            Auth::None => "none",
        }
    }
}

/// Per-request options.
///
/// ```
/// use trendreport_http::{Auth, RequestOpts};
///
/// let opts = RequestOpts { allow_absolute: true, ..Default::default() };
/// assert!(matches!(opts.auth, Auth::None));
/// assert!(opts.headers.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts {
    pub auth: Auth,
    pub headers: Option<HeaderMap>,
    /// When `path` parses as an absolute URL, request it instead of joining onto the base.
    pub allow_absolute: bool,
}

/// Status and body, uninterpreted.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub request_id: String,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Body truncated for log lines.
    pub fn snippet(&self) -> String {
        snip_body(&self.body)
    }

    /// Decode the body as JSON regardless of status.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice::<T>(&self.body).map_err(|e| {
            tracing::warn!(
                req_id=%self.request_id,
                serde_line=%e.line(),
                serde_col=%e.column(),
                serde_err=%e,
                body_snippet=%self.snippet(),
                "http.response.decode_error"
            );
            HttpError::Decode(e.to_string(), self.snippet())
        })
    }

    fn into_api_error(self) -> HttpError {
        let message = extract_error_message_multi(&self.body);
        tracing::warn!(
            req_id=%self.request_id,
            status=%self.status,
            message=%message,
            body_snippet=%self.snippet(),
            "http.error"
        );
        HttpError::Api {
            status: self.status,
            message,
            request_id: self.request_id,
        }
    }
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Client rooted at `base`; relative paths are joined onto it.
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
        })
    }

    /// Whole-request deadline, connect through body.
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// GET without interpreting the status.
    pub async fn get_raw(&self, path: &str, opts: RequestOpts) -> Result<RawResponse, HttpError> {
        self.send_internal::<()>(Method::GET, path, None, opts).await
    }

    /// POST a JSON body; non-2xx becomes [`HttpError::Api`], 2xx is decoded as `T`.
    pub async fn post_json_opts<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let raw = self
            .send_internal(Method::POST, path, Some(body), opts)
            .await?;
        if !raw.status.is_success() {
            return Err(raw.into_api_error());
        }
        raw.json()
    }

    fn resolve(&self, path: &str, allow_absolute: bool) -> Result<Url, HttpError> {
        if allow_absolute {
            if let Ok(abs) = Url::parse(path) {
                return Ok(abs);
            }
        }
        self.base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    async fn send_internal<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: RequestOpts,
    ) -> Result<RawResponse, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.resolve(path, opts.allow_absolute)?;
        let timeout = self.default_timeout;
        let mut headers = opts.headers.unwrap_or_default();
        if let Auth::Header { name, value } = &opts.auth {
            headers.insert(name.clone(), value.clone());
        }
        let body_bytes = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| HttpError::Build(e.to_string()))?;

        let mut rb = self
            .inner
            .request(method.clone(), url.clone())
            .timeout(timeout)
            .headers(headers.clone());
        if let Some(bytes) = &body_bytes {
            rb = rb
                .header(header::CONTENT_TYPE, "application/json")
                .body(bytes.clone());
        }

        let req_id = format!(
            "r{:x}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );

        tracing::debug!(
            req_id=%req_id,
            method=%method,
            host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            timeout_ms=timeout.as_millis() as u64,
            auth_kind=opts.auth.kind(),
            has_body=%body.is_some(),
            "http.request.start"
        );

        if raw_enabled() {
            let curl = make_curl(&method, &url, &headers, body_bytes.as_deref());
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        let t0 = std::time::Instant::now();
        let resp = rb.send().await.map_err(|err| {
            tracing::warn!(req_id=%req_id, message=%err, "http.network_error.send");
            transport_error(err, timeout)
        })?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(|err| {
            tracing::warn!(req_id=%req_id, message=%err, "http.network_error.body");
            transport_error(err, timeout)
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        let request_id = headers
            .get("request-id")
            .or_else(|| headers.get("x-request-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or(req_id.as_str())
            .to_string();

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=bytes.len(),
            upstream_request_id=%request_id,
            "http.response.headers"
        );

        if raw_enabled() {
            let hdrs = redact_headers(&headers);
            let truncated = bytes.len() > RAW_MAX_BODY;
            let text = String::from_utf8_lossy(&bytes[..bytes.len().min(RAW_MAX_BODY)]);
            tracing::info!(
                target:"http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                headers=?hdrs,
                body=%text,
                truncated
            );
        }

        tracing::trace!(
            req_id=%req_id,
            body_snippet=%snip_body(&bytes),
            "http.response.body_snippet"
        );

        Ok(RawResponse {
            status,
            request_id,
            body: bytes.to_vec(),
        })
    }
}

fn transport_error(err: reqwest::Error, timeout: Duration) -> HttpError {
    if err.is_timeout() {
        HttpError::Timeout(timeout)
    } else {
        HttpError::Network(err.to_string())
    }
}

fn extract_error_message_multi(body: &[u8]) -> String {
    // Anthropic/OpenAI style: {"error":{"type":"...","message":"..."}}
    #[derive(Deserialize)]
    struct Envelope {
        error: Detail,
    }
    #[derive(Deserialize)]
    struct Detail {
        #[serde(default, rename = "type")]
        kind: String,
        message: String,
    }

    // Generic: {"message":"..."} or {"msg":"..."} or {"error":"..."}
    #[derive(Deserialize)]
    struct Msg {
        #[serde(default)]
        message: String,
        #[serde(default)]
        msg: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(env) = serde_json::from_slice::<Envelope>(body) {
        if env.error.kind.is_empty() {
            return env.error.message;
        }
        return format!("{}: {}", env.error.kind, env.error.message);
    }
    if let Ok(m) = serde_json::from_slice::<Msg>(body) {
        for candidate in [m.message, m.msg, m.error] {
            if !candidate.is_empty() {
                return candidate;
            }
        }
    }
    snip_body(body)
}

fn truncate_chars(s: &str, max: usize) -> Cow<'_, str> {
    if s.len() <= max {
        return Cow::Borrowed(s);
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    Cow::Owned(format!("{}...", &s[..end]))
}

fn snip_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    truncate_chars(&text, SNIPPET_MAX).into_owned()
}

/// Strip quotes and whitespace picked up when keys are pasted into env files.
fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    let key: String = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    if key.is_empty() {
        return Err(HttpError::Build("API key is empty".into()));
    }
    if !key.is_ascii() || key.bytes().any(|b| b.is_ascii_control()) {
        return Err(HttpError::Build(
            "API key contains non-ASCII or control characters".into(),
        ));
    }
    Ok(key)
}

/// Build a header value from a secret, trimming the usual copy/paste noise.
///
/// ```
/// let v = trendreport_http::secret_header_value("  'sk-abc'\n").unwrap();
/// assert_eq!(v.to_str().unwrap(), "sk-abc");
/// assert!(v.is_sensitive());
/// ```
pub fn secret_header_value(raw: &str) -> Result<HeaderValue, HttpError> {
    let clean = sanitize_api_key(raw)?;
    let mut value =
        HeaderValue::from_str(&clean).map_err(|e| HttpError::Build(format!("invalid header: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}
