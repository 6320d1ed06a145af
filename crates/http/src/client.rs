use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, warn};

use crate::{HttpConfig, HttpRequest, Method, Transport, TransportError};

/// `Transport` over a pooled reqwest client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    config: HttpConfig,
}

impl ReqwestTransport {
    pub fn new(config: HttpConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        for (k, v) in &config.headers {
            let name = HeaderName::from_bytes(k.as_bytes()).map_err(|e| TransportError::Network(format!("header {k}: {e}")))?;
            let value = HeaderValue::from_str(v).map_err(|e| TransportError::Network(format!("header {k}: {e}")))?;
            headers.insert(name, value);
        }
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpConfig { &self.config }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_decode() {
        TransportError::Decode(e.to_string())
    } else {
        TransportError::Network(e.to_string())
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, req: HttpRequest) -> Result<serde_json::Value, TransportError> {
        let t0 = Instant::now();
        let url = self.config.url_for(&req.path);
        let mut builder = match req.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }
        let resp = builder.send().await.map_err(classify)?;
        let status = resp.status();
        let text = resp.text().await.map_err(classify)?;
        metrics::histogram!("http_request_ms", t0.elapsed().as_secs_f64() * 1_000.0);
        if !status.is_success() {
            warn!(method = %req.method, path = %req.path, status = status.as_u16(), "http: non-success status");
            return Err(TransportError::Status { code: status.as_u16(), message: text });
        }
        debug!(method = %req.method, path = %req.path, status = status.as_u16(), took_ms = %t0.elapsed().as_millis(), "http: ok");
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))
    }
}
