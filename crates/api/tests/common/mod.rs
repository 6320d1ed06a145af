#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use weedle_api::{ClusterApiResponse, ClusterSummary, HttpApi};
use weedle_query::{HttpRequest, QueryClient, QueryConfig, Transport, TransportError};

type Route = Box<dyn Fn(&HttpRequest) -> Result<Value, TransportError> + Send + Sync>;

/// In-memory API answering by request line (`GET /path?k=v`).
pub struct Router {
    route: Route,
    latency: Duration,
    log: Mutex<Vec<String>>,
}

pub fn request_line(req: &HttpRequest) -> String {
    let mut line = format!("{} {}", req.method, req.path);
    if !req.query.is_empty() {
        let qs: Vec<String> = req.query.iter().map(|(k, v)| format!("{k}={v}")).collect();
        line.push('?');
        line.push_str(&qs.join("&"));
    }
    line
}

impl Router {
    pub fn new<F>(route: F) -> Arc<Self>
    where
        F: Fn(&HttpRequest) -> Result<Value, TransportError> + Send + Sync + 'static,
    {
        Arc::new(Self { route: Box::new(route), latency: Duration::from_millis(20), log: Mutex::new(Vec::new()) })
    }

    pub fn log(&self) -> Vec<String> { self.log.lock().unwrap().clone() }

    pub fn count(&self, prefix: &str) -> usize { self.log().iter().filter(|l| l.starts_with(prefix)).count() }
}

#[async_trait::async_trait]
impl Transport for Router {
    async fn send(&self, req: HttpRequest) -> Result<Value, TransportError> {
        self.log.lock().unwrap().push(request_line(&req));
        tokio::time::sleep(self.latency).await;
        (self.route)(&req)
    }
}

pub fn api(router: &Arc<Router>) -> HttpApi {
    HttpApi::new(QueryClient::new(router.clone(), QueryConfig::default()))
}

pub fn status(code: u16, body: &str) -> TransportError { TransportError::Status { code, message: body.to_string() } }

/// KPI answers scaled by the `cluster_id` query parameter (1 when absent).
pub fn kpi_route(req: &HttpRequest) -> Result<Value, TransportError> {
    let scale: f64 = req.query.iter().find(|(k, _)| k == "cluster_id").and_then(|(_, v)| v.parse().ok()).unwrap_or(1.0);
    let body = match req.path.as_str() {
        "/dashboard/ltv-medio" => json!({ "valor": 1000.0 * scale }),
        "/dashboard/ticket-medio" => json!({ "valor": 250.5 * scale }),
        "/dashboard/taxa-cross-sell" => json!({ "valor": 1.11 }),
        "/dashboard/nps" => json!({
            "kpi": "nps",
            "valores": { "media_nps_geral": 7.4, "media_nps_relacional": 7.9, "media_nps_suporte": 6.8 }
        }),
        "/dashboard/tempo-medio-resolucao" => json!({
            "kpi": "tempo_medio_resolucao",
            "valor": 3.2,
            "descricao": "Tempo médio",
            "detalhes": { "total_tickets": 355, "menor_tempo": 0.5, "maior_tempo": 14.0 }
        }),
        other => return Err(status(404, &format!(r#"{{"detail":"{other} not found"}}"#))),
    };
    Ok(body)
}

pub fn summary(id: i64, name: &str, clients: u64, contracts: u64, total: f64) -> ClusterSummary {
    ClusterSummary {
        cluster_id: id,
        descricao: name.to_string(),
        n_clients: clients,
        qtd_contratos: contracts,
        valor_total_contratado: total,
        ..ClusterSummary::default()
    }
}

pub fn clusters(rows: Vec<ClusterSummary>) -> ClusterApiResponse { ClusterApiResponse { clusters: rows } }
