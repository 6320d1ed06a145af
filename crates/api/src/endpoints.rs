//! Endpoint catalogue: every call the dashboard makes, with its retry tier
//! and cache tags.

use serde_json::json;
use weedle_query::{HttpRequest, Mutation, Params, Query, RetryTier, Tag};

use crate::dto::*;
use crate::{ClusterFilter, CLUSTER, COMPANY, DASHBOARD, REPORT};

/// `id` used for tags that stand for a whole collection.
pub const LIST_ID: &str = "LIST";

fn filtered(path: &str, filter: &ClusterFilter) -> HttpRequest {
    let req = HttpRequest::get(path);
    match filter.id() {
        Some(id) => req.query("cluster_id", id),
        None => req,
    }
}

fn filter_params(filter: &ClusterFilter) -> Params { Params::new().with_opt("cluster_id", filter.id()) }

macro_rules! kpi_query {
    ($ty:ident, $name:literal, $path:literal, $out:ty) => {
        pub struct $ty;

        impl Query for $ty {
            const NAME: &'static str = $name;
            const TIER: RetryTier = RetryTier::Critical;
            type Args = ClusterFilter;
            type Output = $out;

            fn request(filter: &ClusterFilter) -> HttpRequest { filtered($path, filter) }
            fn params(filter: &ClusterFilter) -> Params { filter_params(filter) }
            fn provides(_: &ClusterFilter) -> Vec<Tag> { vec![Tag::kind(DASHBOARD)] }
        }
    };
}

kpi_query!(GetLtvMedio, "ltv_medio", "/dashboard/ltv-medio", KpiValue);
kpi_query!(GetTicketMedio, "ticket_medio", "/dashboard/ticket-medio", KpiValue);
kpi_query!(GetTaxaCrossSell, "taxa_cross_sell", "/dashboard/taxa-cross-sell", KpiValue);
kpi_query!(GetNps, "nps", "/dashboard/nps", NpsKpi);
kpi_query!(GetTempoMedioResolucao, "tempo_medio_resolucao", "/dashboard/tempo-medio-resolucao", ResolutionKpi);

pub struct GetClusters;

impl Query for GetClusters {
    const NAME: &'static str = "clusters";
    const TIER: RetryTier = RetryTier::Critical;
    type Args = ();
    type Output = ClusterApiResponse;

    fn request(_: &()) -> HttpRequest { HttpRequest::get("/clusters") }
    fn provides(_: &()) -> Vec<Tag> { vec![Tag::kind(DASHBOARD)] }
}

pub struct GetClusterById;

impl Query for GetClusterById {
    const NAME: &'static str = "cluster";
    const TIER: RetryTier = RetryTier::Normal;
    type Args = String;
    type Output = Cluster;

    fn request(id: &String) -> HttpRequest { HttpRequest::get(format!("/clusters/{id}")) }
    fn params(id: &String) -> Params { Params::new().with("id", id) }
    fn provides(id: &String) -> Vec<Tag> { vec![Tag::with_id(CLUSTER, id.clone())] }
}

pub struct GetDashboardData;

impl Query for GetDashboardData {
    const NAME: &'static str = "dashboard";
    const TIER: RetryTier = RetryTier::Critical;
    type Args = ();
    type Output = DashboardData;

    fn request(_: &()) -> HttpRequest { HttpRequest::get("/dashboard") }
    fn provides(_: &()) -> Vec<Tag> { vec![Tag::kind(DASHBOARD)] }
}

pub struct GetLeads;

impl Query for GetLeads {
    const NAME: &'static str = "leads";
    const TIER: RetryTier = RetryTier::Critical;
    type Args = LeadFilters;
    type Output = LeadsResponse;

    fn request(f: &LeadFilters) -> HttpRequest {
        let mut req = HttpRequest::get("/leads");
        for (k, v) in Self::params(f).pairs() {
            req = req.query(k, v);
        }
        req
    }

    fn params(f: &LeadFilters) -> Params {
        Params::new()
            .with_opt("segmento", f.segmento.as_deref())
            .with_opt("cluster_name", f.cluster_name.as_deref())
            .with_opt("produto", f.produto.as_deref())
            .with_opt("limit", f.limit)
            .with_opt("offset", f.offset)
    }

    fn provides(_: &LeadFilters) -> Vec<Tag> { vec![Tag::with_id(COMPANY, LIST_ID)] }
}

pub struct GetCompanies;

impl Query for GetCompanies {
    const NAME: &'static str = "companies";
    const TIER: RetryTier = RetryTier::Normal;
    type Args = ();
    type Output = Vec<Company>;

    fn request(_: &()) -> HttpRequest { HttpRequest::get("/empresas") }
    fn provides(_: &()) -> Vec<Tag> { vec![Tag::kind(COMPANY)] }
}

pub struct GetCompanyById;

impl Query for GetCompanyById {
    const NAME: &'static str = "company";
    const TIER: RetryTier = RetryTier::Normal;
    type Args = String;
    type Output = Company;

    fn request(id: &String) -> HttpRequest { HttpRequest::get(format!("/empresas/{id}")) }
    fn params(id: &String) -> Params { Params::new().with("id", id) }
    fn provides(id: &String) -> Vec<Tag> { vec![Tag::with_id(COMPANY, id.clone())] }
}

pub struct GetCompaniesByCluster;

impl Query for GetCompaniesByCluster {
    const NAME: &'static str = "companies_by_cluster";
    const TIER: RetryTier = RetryTier::Normal;
    type Args = String;
    type Output = Vec<Company>;

    fn request(cluster_id: &String) -> HttpRequest { HttpRequest::get(format!("/clusters/{cluster_id}/empresas")) }
    fn params(cluster_id: &String) -> Params { Params::new().with("cluster_id", cluster_id) }
    fn provides(cluster_id: &String) -> Vec<Tag> {
        vec![Tag::with_id(COMPANY, LIST_ID), Tag::with_id(CLUSTER, cluster_id.clone())]
    }
}

pub struct GetStatistics;

impl Query for GetStatistics {
    const NAME: &'static str = "statistics";
    const TIER: RetryTier = RetryTier::Normal;
    type Args = ();
    type Output = Statistics;

    fn request(_: &()) -> HttpRequest { HttpRequest::get("/statistics") }
    fn provides(_: &()) -> Vec<Tag> { vec![Tag::kind(DASHBOARD)] }
}

pub struct GetCompaniesReport;

impl Query for GetCompaniesReport {
    const NAME: &'static str = "companies_report";
    const TIER: RetryTier = RetryTier::Normal;
    type Args = ();
    type Output = ReportData;

    fn request(_: &()) -> HttpRequest { HttpRequest::get("/reports/companies") }
    fn provides(_: &()) -> Vec<Tag> { vec![Tag::kind(REPORT)] }
}

// ---------------- Mutations ----------------

pub struct SimulateLead;

impl Mutation for SimulateLead {
    const NAME: &'static str = "simulate_lead";
    const TIER: RetryTier = RetryTier::Light;
    type Args = SimulateLeadRequest;
    type Output = SimulateLeadResponse;

    fn request(lead: &SimulateLeadRequest) -> HttpRequest {
        HttpRequest::post("/simular-leads", serde_json::to_value(lead).unwrap_or_else(|_| json!({})))
    }
    fn invalidates(_: &SimulateLeadRequest) -> Vec<Tag> { vec![Tag::kind(COMPANY), Tag::kind(DASHBOARD)] }
}

pub struct CreateCompany;

impl Mutation for CreateCompany {
    const NAME: &'static str = "create_company";
    const TIER: RetryTier = RetryTier::Normal;
    type Args = CompanyPatch;
    type Output = Company;

    fn request(c: &CompanyPatch) -> HttpRequest {
        HttpRequest::post("/empresas", serde_json::to_value(c).unwrap_or_else(|_| json!({})))
    }
    fn invalidates(_: &CompanyPatch) -> Vec<Tag> { vec![Tag::kind(COMPANY)] }
}

pub struct UpdateCompany;

impl Mutation for UpdateCompany {
    const NAME: &'static str = "update_company";
    const TIER: RetryTier = RetryTier::Normal;
    type Args = (String, CompanyPatch);
    type Output = Company;

    fn request((id, updates): &(String, CompanyPatch)) -> HttpRequest {
        HttpRequest::put(format!("/empresas/{id}"), serde_json::to_value(updates).unwrap_or_else(|_| json!({})))
    }
    fn invalidates((id, _): &(String, CompanyPatch)) -> Vec<Tag> { vec![Tag::with_id(COMPANY, id.clone())] }
}

pub struct DeleteCompany;

impl Mutation for DeleteCompany {
    const NAME: &'static str = "delete_company";
    const TIER: RetryTier = RetryTier::Normal;
    type Args = String;
    type Output = serde_json::Value;

    fn request(id: &String) -> HttpRequest { HttpRequest::delete(format!("/empresas/{id}")) }
    fn invalidates(_: &String) -> Vec<Tag> { vec![Tag::kind(COMPANY)] }
}

pub struct CreateCluster;

impl Mutation for CreateCluster {
    const NAME: &'static str = "create_cluster";
    const TIER: RetryTier = RetryTier::Normal;
    type Args = ClusterPatch;
    type Output = Cluster;

    fn request(c: &ClusterPatch) -> HttpRequest {
        HttpRequest::post("/clusters", serde_json::to_value(c).unwrap_or_else(|_| json!({})))
    }
    fn invalidates(_: &ClusterPatch) -> Vec<Tag> { vec![Tag::kind(CLUSTER)] }
}

pub struct UpdateCluster;

impl Mutation for UpdateCluster {
    const NAME: &'static str = "update_cluster";
    const TIER: RetryTier = RetryTier::Normal;
    type Args = (String, ClusterPatch);
    type Output = Cluster;

    fn request((id, updates): &(String, ClusterPatch)) -> HttpRequest {
        HttpRequest::put(format!("/clusters/{id}"), serde_json::to_value(updates).unwrap_or_else(|_| json!({})))
    }
    fn invalidates((id, _): &(String, ClusterPatch)) -> Vec<Tag> { vec![Tag::with_id(CLUSTER, id.clone())] }
}

pub struct DeleteCluster;

impl Mutation for DeleteCluster {
    const NAME: &'static str = "delete_cluster";
    const TIER: RetryTier = RetryTier::Normal;
    type Args = String;
    type Output = serde_json::Value;

    fn request(id: &String) -> HttpRequest { HttpRequest::delete(format!("/clusters/{id}")) }
    fn invalidates(_: &String) -> Vec<Tag> { vec![Tag::kind(CLUSTER)] }
}
