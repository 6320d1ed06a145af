use std::sync::Arc;
use std::time::Instant;

use tracing::info;
use weedle_http::{HttpConfig, ReqwestTransport};
use weedle_query::{QueryClient, QueryConfig};

use crate::dto::*;
use crate::endpoints::*;
use crate::{shape_clusters, ClusterFilter, ClusterView, DashboardMetrics, MetricsHandle, WeedleApi, WeedleError, WeedleResult};

/// Remote implementation backed by the query cache.
#[derive(Clone)]
pub struct HttpApi {
    client: QueryClient,
}

impl HttpApi {
    pub fn new(client: QueryClient) -> Self { Self { client } }

    /// Reqwest transport and cache settings from `WEEDLE_*` variables.
    pub fn from_env() -> WeedleResult<Self> {
        let transport = ReqwestTransport::new(HttpConfig::from_env()).map_err(|e| WeedleError::Internal(e.to_string()))?;
        Ok(Self::new(QueryClient::new(Arc::new(transport), QueryConfig::from_env())))
    }

    pub fn client(&self) -> &QueryClient { &self.client }
}

fn owned<T: Clone>(v: Arc<T>) -> T { Arc::try_unwrap(v).unwrap_or_else(|shared| (*shared).clone()) }

#[async_trait::async_trait]
impl WeedleApi for HttpApi {
    async fn clusters(&self) -> WeedleResult<Vec<ClusterView>> {
        let t0 = Instant::now();
        let raw = self.client.fetch::<GetClusters>(&()).await?;
        let out = shape_clusters(&raw);
        info!(count = out.len(), took_ms = %t0.elapsed().as_millis(), "api: clusters ok");
        Ok(out)
    }

    async fn metrics(&self, filter: &ClusterFilter) -> WeedleResult<DashboardMetrics> {
        let t0 = Instant::now();
        let mut handle = MetricsHandle::subscribe(&self.client, filter.clone());
        let snap = handle.settled().await?;
        if let Some(e) = snap.error {
            return Err(e.into());
        }
        metrics::histogram!("api_metrics_ms", t0.elapsed().as_secs_f64() * 1_000.0, "scope" => filter.scope());
        info!(filter = %filter, took_ms = %t0.elapsed().as_millis(), "api: metrics ok");
        Ok(snap.metrics)
    }

    async fn dashboard(&self) -> WeedleResult<DashboardData> {
        Ok(owned(self.client.fetch::<GetDashboardData>(&()).await?))
    }

    async fn statistics(&self) -> WeedleResult<Statistics> {
        Ok(owned(self.client.fetch::<GetStatistics>(&()).await?))
    }

    async fn companies(&self) -> WeedleResult<Vec<Company>> {
        let t0 = Instant::now();
        let out = owned(self.client.fetch::<GetCompanies>(&()).await?);
        info!(count = out.len(), took_ms = %t0.elapsed().as_millis(), "api: companies ok");
        Ok(out)
    }

    async fn company(&self, id: &str) -> WeedleResult<Company> {
        Ok(owned(self.client.fetch::<GetCompanyById>(&id.to_string()).await?))
    }

    async fn companies_by_cluster(&self, cluster_id: &str) -> WeedleResult<Vec<Company>> {
        Ok(owned(self.client.fetch::<GetCompaniesByCluster>(&cluster_id.to_string()).await?))
    }

    async fn companies_report(&self) -> WeedleResult<ReportData> {
        Ok(owned(self.client.fetch::<GetCompaniesReport>(&()).await?))
    }

    async fn leads(&self, filters: &LeadFilters) -> WeedleResult<LeadsResponse> {
        let t0 = Instant::now();
        let out = owned(self.client.fetch::<GetLeads>(filters).await?);
        info!(count = out.leads.len(), total = out.total, took_ms = %t0.elapsed().as_millis(), "api: leads ok");
        Ok(out)
    }

    async fn simulate_lead(&self, lead: SimulateLeadRequest) -> WeedleResult<SimulateLeadResponse> {
        lead.validate().map_err(WeedleError::Validation)?;
        let t0 = Instant::now();
        let out = self.client.mutate::<SimulateLead>(&lead).await?;
        metrics::counter!("api_leads_simulated_total", 1u64);
        info!(lead_id = %out.lead_id, took_ms = %t0.elapsed().as_millis(), "api: simulate_lead ok");
        Ok(out)
    }

    async fn create_company(&self, company: CompanyPatch) -> WeedleResult<Company> {
        Ok(self.client.mutate::<CreateCompany>(&company).await?)
    }

    async fn update_company(&self, id: &str, updates: CompanyPatch) -> WeedleResult<Company> {
        Ok(self.client.mutate::<UpdateCompany>(&(id.to_string(), updates)).await?)
    }

    async fn delete_company(&self, id: &str) -> WeedleResult<()> {
        self.client.mutate::<DeleteCompany>(&id.to_string()).await?;
        Ok(())
    }

    async fn cluster(&self, id: &str) -> WeedleResult<Cluster> {
        Ok(owned(self.client.fetch::<GetClusterById>(&id.to_string()).await?))
    }

    async fn create_cluster(&self, cluster: ClusterPatch) -> WeedleResult<Cluster> {
        let out = self.client.mutate::<CreateCluster>(&cluster).await?;
        info!(id = %out.id, "api: cluster created");
        Ok(out)
    }

    async fn update_cluster(&self, id: &str, updates: ClusterPatch) -> WeedleResult<Cluster> {
        Ok(self.client.mutate::<UpdateCluster>(&(id.to_string(), updates)).await?)
    }

    async fn delete_cluster(&self, id: &str) -> WeedleResult<()> {
        self.client.mutate::<DeleteCluster>(&id.to_string()).await?;
        info!(id, "api: cluster deleted");
        Ok(())
    }
}
