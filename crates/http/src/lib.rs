//! Weedle http: the transport primitive under the query layer.
//!
//! Requests are plain values (`HttpRequest`), responses are JSON documents,
//! and every failure is classified once here so callers can decide whether a
//! retry makes sense.

#![forbid(unsafe_code)]

use std::time::Duration;

use serde::{Deserialize, Serialize};

mod client;

pub use client::ReqwestTransport;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8010/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Status codes worth another attempt.
pub const RETRYABLE_STATUS: [u16; 6] = [408, 429, 500, 502, 503, 504];
/// Client errors that will not change on retry.
pub const FAIL_FAST_STATUS: [u16; 5] = [400, 401, 403, 404, 422];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub headers: Vec<(String, String)>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ],
        }
    }
}

impl HttpConfig {
    /// Defaults overridden by `WEEDLE_API_URL` and `WEEDLE_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(url) = std::env::var("WEEDLE_API_URL") {
            if !url.trim().is_empty() {
                cfg.base_url = url.trim().to_string();
            }
        }
        if let Some(secs) = std::env::var("WEEDLE_TIMEOUT_SECS").ok().and_then(|s| s.parse::<u64>().ok()) {
            cfg.timeout = Duration::from_secs(secs.max(1));
        }
        cfg
    }

    /// Join `path` onto the base URL with exactly one slash between them.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    fn new(method: Method, path: impl Into<String>, body: Option<serde_json::Value>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body }
    }

    pub fn get(path: impl Into<String>) -> Self { Self::new(Method::Get, path, None) }
    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self { Self::new(Method::Post, path, Some(body)) }
    pub fn put(path: impl Into<String>, body: serde_json::Value) -> Self { Self::new(Method::Put, path, Some(body)) }
    pub fn delete(path: impl Into<String>) -> Self { Self::new(Method::Delete, path, None) }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("network: {0}")]
    Network(String),
    #[error("timeout")]
    Timeout,
    #[error("status {code}: {message}")]
    Status { code: u16, message: String },
    #[error("decode: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Network(_) | TransportError::Timeout => true,
            TransportError::Status { code, .. } => RETRYABLE_STATUS.contains(code),
            TransportError::Decode(_) => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The message the API put in an error body, if any.
    ///
    /// JSON bodies are searched for `message` then `detail`; a non-JSON body
    /// is returned as-is.
    pub fn server_message(&self) -> Option<String> {
        let TransportError::Status { message, .. } = self else {
            return None;
        };
        let text = message.trim();
        if text.is_empty() {
            return None;
        }
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(serde_json::Value::Object(map)) => ["message", "detail"]
                .iter()
                .find_map(|k| map.get(*k).and_then(|v| v.as_str()))
                .map(str::to_string),
            Ok(serde_json::Value::String(s)) => Some(s),
            Ok(_) => None,
            Err(_) => Some(text.to_string()),
        }
    }
}

/// One request in, one JSON document out.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, req: HttpRequest) -> Result<serde_json::Value, TransportError>;
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, req: HttpRequest) -> Result<serde_json::Value, TransportError> { (**self).send(req).await }
}
