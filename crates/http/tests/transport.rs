#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use weedle_http::{
    HttpConfig, HttpRequest, Method, Transport, TransportError, FAIL_FAST_STATUS, RETRYABLE_STATUS,
};

fn status(code: u16, message: &str) -> TransportError {
    TransportError::Status { code, message: message.to_string() }
}

#[test]
fn retryable_classification() {
    assert!(TransportError::Network("connection refused".into()).is_retryable());
    assert!(TransportError::Timeout.is_retryable());
    for code in RETRYABLE_STATUS {
        assert!(status(code, "").is_retryable(), "{code}");
    }
    for code in FAIL_FAST_STATUS {
        assert!(!status(code, "").is_retryable(), "{code}");
    }
    assert!(!TransportError::Decode("eof".into()).is_retryable());
}

#[test]
fn server_message_prefers_message_then_detail() {
    assert_eq!(status(422, r#"{"message":"CNPJ inválido","detail":"x"}"#).server_message().as_deref(), Some("CNPJ inválido"));
    assert_eq!(status(404, r#"{"detail":"Cluster não encontrado"}"#).server_message().as_deref(), Some("Cluster não encontrado"));
    assert_eq!(status(500, "upstream exploded").server_message().as_deref(), Some("upstream exploded"));
    assert_eq!(status(500, r#"{"code":17}"#).server_message(), None);
    assert_eq!(status(503, "  ").server_message(), None);
    assert_eq!(TransportError::Timeout.server_message(), None);
}

#[test]
fn request_builders() {
    let r = HttpRequest::get("/dashboard/nps").query("cluster_id", "3");
    assert_eq!(r.method, Method::Get);
    assert_eq!(r.query, vec![("cluster_id".to_string(), "3".to_string())]);
    assert!(r.body.is_none());

    let r = HttpRequest::post("/simular-leads", serde_json::json!({ "quantidade": 5 }));
    assert_eq!(r.method.as_str(), "POST");
    assert_eq!(r.body, Some(serde_json::json!({ "quantidade": 5 })));
    assert_eq!(HttpRequest::delete("/empresas/1").method, Method::Delete);
}

#[test]
fn config_defaults_and_url_join() {
    let cfg = HttpConfig::default();
    assert_eq!(cfg.base_url, "http://localhost:8010/");
    assert_eq!(cfg.timeout, Duration::from_secs(30));
    assert!(cfg.headers.iter().any(|(k, v)| k == "Accept" && v == "application/json"));
    assert_eq!(cfg.url_for("/clusters"), "http://localhost:8010/clusters");
    assert_eq!(cfg.url_for("clusters"), "http://localhost:8010/clusters");
}

#[test]
fn config_from_env() {
    std::env::set_var("WEEDLE_API_URL", "http://api.internal:9000");
    std::env::set_var("WEEDLE_TIMEOUT_SECS", "5");
    let cfg = HttpConfig::from_env();
    std::env::remove_var("WEEDLE_API_URL");
    std::env::remove_var("WEEDLE_TIMEOUT_SECS");
    assert_eq!(cfg.url_for("/nps"), "http://api.internal:9000/nps");
    assert_eq!(cfg.timeout, Duration::from_secs(5));
}

struct Echo;

#[async_trait::async_trait]
impl Transport for Echo {
    async fn send(&self, req: HttpRequest) -> Result<serde_json::Value, TransportError> {
        Ok(serde_json::json!({ "path": req.path }))
    }
}

#[tokio::test]
async fn shared_transport_delegates() {
    let t: Arc<dyn Transport> = Arc::new(Echo);
    let v = t.send(HttpRequest::get("/clusters")).await.unwrap();
    assert_eq!(v["path"], "/clusters");
}
