//! Weedle public API façade.
//!
//! This crate defines the typed surface frontends (CLI and tests) depend on:
//! the endpoint catalogue, wire DTOs, dashboard shaping helpers and the
//! `WeedleApi` trait with a remote (`HttpApi`) and an in-memory (`MockApi`)
//! implementation.

#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use weedle_query::QueryError;

pub mod clusters;
pub mod dashboard;
pub mod dto;
pub mod endpoints;
mod http;
mod mock;
mod rows;
mod session;

pub use clusters::{shape_clusters, ClusterView};
pub use dashboard::{DashboardMetrics, MetricsHandle, MetricsSnapshot};
pub use dto::*;
pub use http::HttpApi;
pub use mock::{sample_nps_analytics, MockApi};
pub use session::SessionStore;

// Cache tag kinds
pub const COMPANY: &str = "Company";
pub const CLUSTER: &str = "Cluster";
pub const DASHBOARD: &str = "Dashboard";
pub const STATISTICS: &str = "Statistics";
pub const REPORT: &str = "Report";

/// API errors carrying a message fit for the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum WeedleError {
    #[error("validation: {0}")]
    Validation(String),
    #[error("not_found: {0}")]
    NotFound(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl WeedleError {
    pub fn message(&self) -> &str {
        match self {
            WeedleError::Validation(m) | WeedleError::NotFound(m) | WeedleError::Unavailable(m) | WeedleError::Internal(m) => m,
        }
    }
}

impl From<QueryError> for WeedleError {
    fn from(e: QueryError) -> Self {
        let msg = e.user_message();
        match &e {
            QueryError::Rejected(_) => match e.status() {
                Some(404) => WeedleError::NotFound(msg),
                Some(400 | 422) => WeedleError::Validation(msg),
                _ => WeedleError::Internal(msg),
            },
            QueryError::Exhausted { .. } => WeedleError::Unavailable(msg),
            QueryError::Decode(detail) => WeedleError::Internal(format!("{msg} ({detail})")),
            QueryError::Cancelled => WeedleError::Internal("request cancelled".to_string()),
        }
    }
}

pub type WeedleResult<T> = Result<T, WeedleError>;

/// Scope of the dashboard KPIs: every cluster or a single one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClusterFilter {
    #[default]
    All,
    Id(String),
}

impl ClusterFilter {
    pub fn id(&self) -> Option<&str> {
        match self {
            ClusterFilter::All => None,
            ClusterFilter::Id(id) => Some(id),
        }
    }

    /// Bounded label for metrics: `all` or `cluster`, never the id itself.
    pub fn scope(&self) -> &'static str {
        match self {
            ClusterFilter::All => "all",
            ClusterFilter::Id(_) => "cluster",
        }
    }
}

impl FromStr for ClusterFilter {
    type Err = std::convert::Infallible;

    /// `"all"` (any case) or an empty string selects every cluster.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(ClusterFilter::All)
        } else {
            Ok(ClusterFilter::Id(s.to_string()))
        }
    }
}

impl fmt::Display for ClusterFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.id().unwrap_or("all")) }
}

/// Declarative Weedle API surface.
#[async_trait::async_trait]
pub trait WeedleApi: Send + Sync {
    /// Cluster aggregates shaped for display.
    async fn clusters(&self) -> WeedleResult<Vec<ClusterView>>;

    /// The five headline KPIs for a cluster filter.
    async fn metrics(&self, filter: &ClusterFilter) -> WeedleResult<DashboardMetrics>;

    async fn dashboard(&self) -> WeedleResult<DashboardData>;

    async fn statistics(&self) -> WeedleResult<Statistics>;

    async fn companies(&self) -> WeedleResult<Vec<Company>>;

    async fn company(&self, id: &str) -> WeedleResult<Company>;

    async fn companies_by_cluster(&self, cluster_id: &str) -> WeedleResult<Vec<Company>>;

    async fn companies_report(&self) -> WeedleResult<ReportData>;

    async fn leads(&self, filters: &LeadFilters) -> WeedleResult<LeadsResponse>;

    /// Validates the request before sending it.
    async fn simulate_lead(&self, lead: SimulateLeadRequest) -> WeedleResult<SimulateLeadResponse>;

    async fn create_company(&self, company: CompanyPatch) -> WeedleResult<Company>;

    async fn update_company(&self, id: &str, updates: CompanyPatch) -> WeedleResult<Company>;

    async fn delete_company(&self, id: &str) -> WeedleResult<()>;

    /// A cluster entity with its companies.
    async fn cluster(&self, id: &str) -> WeedleResult<Cluster>;

    async fn create_cluster(&self, cluster: ClusterPatch) -> WeedleResult<Cluster>;

    async fn update_cluster(&self, id: &str, updates: ClusterPatch) -> WeedleResult<Cluster>;

    async fn delete_cluster(&self, id: &str) -> WeedleResult<()>;
}
