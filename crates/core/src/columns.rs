//! Column descriptors and the built-in column sets of the dashboard tables.
//!
//! This module provides:
//! - `ColumnSpec`: key, header label, sort/highlight flags and a width hint
//! - Stable column keys for each built-in table
//! - `builtin_columns_for` mapping a table kind to its column set

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::CoreError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub key: String,
    pub label: String,
    pub sortable: bool,
    pub highlighted: bool,
    /// Width hint in characters for text rendering.
    pub width: usize,
}

impl ColumnSpec {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        let label = label.into();
        let width = label.chars().count().max(8);
        Self { key: key.into(), label, sortable: true, highlighted: false, width }
    }

    pub fn unsortable(mut self) -> Self { self.sortable = false; self }

    pub fn highlighted(mut self) -> Self { self.highlighted = true; self }

    pub fn width(mut self, width: usize) -> Self { self.width = width; self }
}

/// Check the per-table invariants: keys are non-empty and unique.
pub fn validate_columns(columns: &[ColumnSpec]) -> Result<(), CoreError> {
    let mut seen: Vec<&str> = Vec::with_capacity(columns.len());
    for c in columns {
        if c.key.is_empty() {
            return Err(CoreError::EmptyKey(c.label.clone()));
        }
        if seen.contains(&c.key.as_str()) {
            return Err(CoreError::DuplicateColumn(c.key.clone()));
        }
        seen.push(&c.key);
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    Clusters,
    NpsAnalytics,
    Leads,
    Companies,
}

// ---------------- Column keys (stable) ----------------
// Clusters (shaped ClusterView rows)
pub const CLUSTER_NAME: &str = "name";
pub const CLUSTER_CLIENTS: &str = "clients";
pub const CLUSTER_AVG_TICKET: &str = "avg_ticket";
pub const CLUSTER_FREQUENCY: &str = "frequency";
pub const CLUSTER_CONTRACTS: &str = "contracts";
pub const CLUSTER_TOTAL_CONTRACTED: &str = "total_contracted";
pub const CLUSTER_NPS: &str = "nps";
pub const CLUSTER_OPEN_TICKETS: &str = "open_tickets";
pub const CLUSTER_RESOLUTION_DAYS: &str = "resolution_days";
pub const CLUSTER_ID: &str = "id";
pub const CLUSTER_NUMERIC_ID: &str = "cluster_id";
pub const CLUSTER_BEHAVIOUR: &str = "behaviour";
pub const CLUSTER_ACTIONS: &str = "actions";
pub const CLUSTER_COLOR: &str = "color";
pub const CLUSTER_KEYWORDS: &str = "keywords";
pub const CLUSTER_DISCOUNT: &str = "discount_granted";
pub const CLUSTER_NPS_REVIEWS: &str = "nps_reviews";

// NPS analytics
pub const NPS_CLIENT: &str = "cdCliente";
pub const NPS_SEGMENT: &str = "segmento";
pub const NPS_SUBSEGMENT: &str = "subsegmento";
pub const NPS_REVENUE_BAND: &str = "faixaFaturamento";
pub const NPS_CONTRACT_STATUS: &str = "situacaoContrato";
pub const NPS_CONTRACT_VALUE: &str = "valorTotalContrato";
pub const NPS_DISCOUNT: &str = "percentualDesconto";
pub const NPS_TICKET_RESOLUTION: &str = "mediaResolucaoTicket";
pub const NPS_CLASSIFICATION: &str = "classificacaoNPS";
pub const NPS_AVG_SCORE: &str = "notaMedia";

// Simulated leads
pub const LEAD_CNPJ: &str = "cnpj";
pub const LEAD_COMPANY: &str = "nome_empresa";
pub const LEAD_SEGMENT: &str = "segmento";
pub const LEAD_CAPITAL: &str = "capital_social";
pub const LEAD_EMAIL: &str = "email";
pub const LEAD_PRODUCT: &str = "produto";
pub const LEAD_CONTRACT_VALUE: &str = "valor_contrato";
pub const LEAD_CLUSTER: &str = "cluster_name";
pub const LEAD_SIMULATED_AT: &str = "data_simulacao";

// Companies
pub const COMPANY_NAME: &str = "nomeEmpresa";
pub const COMPANY_CNPJ: &str = "cnpj";
pub const COMPANY_SEGMENT: &str = "segmento";
pub const COMPANY_PRODUCT: &str = "produto";
pub const COMPANY_CONTRACT_VALUE: &str = "valorContrato";
pub const COMPANY_CLUSTER: &str = "cluster";
pub const COMPANY_SIMULATED_AT: &str = "dataSimulacao";
// Not shown by default; resolvable for search and custom column sets
pub const COMPANY_ID: &str = "id";
pub const COMPANY_EMAIL: &str = "email";
pub const COMPANY_CAPITAL: &str = "capitalSocial";

fn col(key: &str, label: &str, width: usize) -> ColumnSpec {
    ColumnSpec::new(key, label).width(width)
}

/// Return the column set for a built-in dashboard table.
pub fn builtin_columns_for(kind: TableKind) -> Vec<ColumnSpec> {
    match kind {
        TableKind::Clusters => vec![
            col(CLUSTER_NAME, "Cluster", 24),
            col(CLUSTER_CLIENTS, "Clientes", 9),
            col(CLUSTER_AVG_TICKET, "Ticket Médio", 14),
            col(CLUSTER_FREQUENCY, "Frequência", 11).unsortable(),
            col(CLUSTER_CONTRACTS, "Contratos", 10),
            col(CLUSTER_TOTAL_CONTRACTED, "Valor Total Contratado", 22).highlighted(),
            col(CLUSTER_NPS, "NPS Médio", 9),
            col(CLUSTER_OPEN_TICKETS, "Tickets Abertos", 15),
            col(CLUSTER_RESOLUTION_DAYS, "Dias Resolução", 14),
        ],
        TableKind::NpsAnalytics => vec![
            col(NPS_CLIENT, "Cliente", 10),
            col(NPS_SEGMENT, "Segmento", 14),
            col(NPS_SUBSEGMENT, "Subsegmento", 24),
            col(NPS_REVENUE_BAND, "Faixa Faturamento", 22),
            col(NPS_CONTRACT_STATUS, "Status Contrato", 15),
            col(NPS_CONTRACT_VALUE, "Valor Total Contrato", 20),
            col(NPS_DISCOUNT, "%Desconto", 9),
            col(NPS_TICKET_RESOLUTION, "Tempo resolução tickets", 23),
            col(NPS_CLASSIFICATION, "Classificacao NPS", 17),
            col(NPS_AVG_SCORE, "Nota Media", 10),
        ],
        TableKind::Leads => vec![
            col(LEAD_CNPJ, "CNPJ", 18),
            col(LEAD_COMPANY, "Empresa", 24),
            col(LEAD_SEGMENT, "Segmento", 14),
            col(LEAD_CAPITAL, "Capital Social", 16),
            col(LEAD_EMAIL, "E-mail", 24).unsortable(),
            col(LEAD_PRODUCT, "Produto", 14),
            col(LEAD_CONTRACT_VALUE, "Valor Contrato", 16).highlighted(),
            col(LEAD_CLUSTER, "Cluster", 18),
            col(LEAD_SIMULATED_AT, "Data Simulação", 14),
        ],
        TableKind::Companies => vec![
            col(COMPANY_NAME, "Empresa", 24),
            col(COMPANY_CNPJ, "CNPJ", 18),
            col(COMPANY_SEGMENT, "Segmento", 14),
            col(COMPANY_PRODUCT, "Produto", 14),
            col(COMPANY_CONTRACT_VALUE, "Valor Contrato", 16).highlighted(),
            col(COMPANY_CLUSTER, "Cluster", 18),
            col(COMPANY_SIMULATED_AT, "Data Simulação", 14),
        ],
    }
}
