//! Wire shapes of the analytics API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------- Clusters ----------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterApiResponse {
    #[serde(default)]
    pub clusters: Vec<ClusterSummary>,
}

/// Aggregates the API computes per customer segment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSummary {
    pub cluster_id: i64,
    pub descricao: String,
    pub comportamento: Option<String>,
    pub total_tickets_abertos: u64,
    pub total_desconto_concedido: f64,
    pub media_nps: f64,
    pub qtd_avaliacoes_nps: u64,
    pub qtd_contratos: u64,
    pub valor_total_contratado: f64,
    pub media_dias_resolucao_ticket: f64,
    pub n_clients: u64,
    pub acoes: Vec<ClusterAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClusterAction {
    #[serde(default)]
    pub acao: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    pub nome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descricao: Option<String>,
    #[serde(default)]
    pub empresas: Vec<Company>,
}

/// Partial cluster for create and update bodies.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClusterPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descricao: Option<String>,
}

impl ClusterPatch {
    pub fn apply_to(&self, c: &mut Cluster) {
        if let Some(v) = &self.nome { c.nome = v.clone(); }
        if let Some(v) = &self.descricao { c.descricao = Some(v.clone()); }
    }
}

// ---------------- Dashboard KPIs ----------------

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KpiValue {
    #[serde(default)]
    pub valor: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NpsKpi {
    pub kpi: String,
    pub valores: NpsValues,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NpsValues {
    pub media_nps_relacional: f64,
    pub media_nps_suporte: f64,
    pub media_nps_geral: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionKpi {
    pub kpi: String,
    pub valor: f64,
    pub unidade: String,
    pub descricao: String,
    pub detalhes: ResolutionDetails,
    pub filtros: KpiFilters,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionDetails {
    pub total_tickets: u64,
    pub menor_tempo: f64,
    pub maior_tempo: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KpiFilters {
    pub cluster_id: Option<String>,
    pub data_inicio: Option<String>,
    pub data_fim: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardData {
    pub total_empresas: u64,
    pub total_contratos: u64,
    pub valor_total_contratos: f64,
    pub clusters: Vec<Cluster>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistics {
    pub total_empresas: u64,
    pub total_contratos: u64,
    pub valor_medio_contrato: f64,
    pub empresas_por_cluster: BTreeMap<String, u64>,
}

/// One customer line of the NPS analytics table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NpsAnalyticsRow {
    pub cd_cliente: String,
    pub segmento: String,
    pub subsegmento: String,
    pub faixa_faturamento: String,
    pub situacao_contrato: String,
    pub valor_total_contrato: f64,
    /// Percent, `1.11` for 1,11%.
    pub percentual_desconto: f64,
    /// Days; absent when the client opened no tickets.
    pub media_resolucao_ticket: Option<f64>,
    #[serde(rename = "classificacaoNPS")]
    pub classificacao_nps: String,
    pub nota_media: f64,
}

// ---------------- Companies ----------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Company {
    pub id: String,
    pub cnpj: String,
    pub nome_empresa: String,
    pub segmento: String,
    pub capital_social: f64,
    pub email: String,
    pub produto: String,
    pub valor_contrato: f64,
    pub cluster: String,
    pub data_simulacao: String,
}

/// Partial company used for create and update bodies; unset fields are omitted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnpj: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome_empresa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segmento: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capital_social: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub produto: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valor_contrato: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
}

impl CompanyPatch {
    pub fn apply_to(&self, c: &mut Company) {
        if let Some(v) = &self.cnpj { c.cnpj = v.clone(); }
        if let Some(v) = &self.nome_empresa { c.nome_empresa = v.clone(); }
        if let Some(v) = &self.segmento { c.segmento = v.clone(); }
        if let Some(v) = self.capital_social { c.capital_social = v; }
        if let Some(v) = &self.email { c.email = v.clone(); }
        if let Some(v) = &self.produto { c.produto = v.clone(); }
        if let Some(v) = self.valor_contrato { c.valor_contrato = v; }
        if let Some(v) = &self.cluster { c.cluster = v.clone(); }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyStatistics {
    pub total_empresas: u64,
    pub total_contratos: u64,
    pub valor_medio_contrato: f64,
    pub valor_total_contratos: f64,
    pub empresas_por_segmento: BTreeMap<String, u64>,
    pub empresas_por_cluster: BTreeMap<String, u64>,
    pub contratos_por_mes: Vec<MonthlyContracts>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonthlyContracts {
    pub mes: String,
    pub quantidade: u64,
    pub valor: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportData {
    pub periodo: ReportPeriod,
    pub resumo: ReportSummary,
    pub detalhes: ReportDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportPeriod {
    pub inicio: String,
    pub fim: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportSummary {
    pub total_empresas: u64,
    pub total_contratos: u64,
    pub valor_total: f64,
    pub crescimento: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportDetails {
    pub empresas: Vec<Company>,
    pub clusters: Vec<Cluster>,
    pub estatisticas: CompanyStatistics,
}

// ---------------- Leads ----------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedLead {
    pub cnpj: String,
    pub nome_empresa: String,
    pub segmento: String,
    pub capital_social: f64,
    pub email: String,
    pub produto: String,
    pub valor_contrato: f64,
    pub cluster_name: String,
    pub data_simulacao: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadFilters {
    pub segmento: Option<String>,
    pub cluster_name: Option<String>,
    pub produto: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

impl LeadFilters {
    pub fn matches(&self, lead: &SimulatedLead) -> bool {
        fn eq(filter: &Option<String>, value: &str) -> bool {
            filter.as_deref().map_or(true, |f| f.eq_ignore_ascii_case(value))
        }
        eq(&self.segmento, &lead.segmento) && eq(&self.cluster_name, &lead.cluster_name) && eq(&self.produto, &lead.produto)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadsResponse {
    pub leads: Vec<SimulatedLead>,
    pub total: u64,
    pub limit: Option<u64>,
    pub offset: u64,
    pub filtros: LeadFilters,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulateLeadRequest {
    pub cnpj: String,
    pub nome_empresa: String,
    pub segmento: String,
    pub capital_social: Option<f64>,
    pub email: String,
    pub produto: String,
    pub valor_contrato: Option<f64>,
}

impl SimulateLeadRequest {
    /// Client-side checks mirrored from the lead form. Returns the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.nome_empresa.trim().is_empty() {
            return Err("nome_empresa é obrigatório".to_string());
        }
        let digits = self.cnpj.chars().filter(char::is_ascii_digit).count();
        let only_cnpj_chars = self.cnpj.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | '/' | '-'));
        if digits != 14 || !only_cnpj_chars {
            return Err(format!("CNPJ inválido: {}", self.cnpj));
        }
        let email = self.email.trim();
        match email.split_once('@') {
            Some((user, domain)) if !user.is_empty() && domain.contains('.') => {}
            _ => return Err(format!("e-mail inválido: {}", self.email)),
        }
        for (name, v) in [("capital_social", self.capital_social), ("valor_contrato", self.valor_contrato)] {
            if v.is_some_and(|x| !x.is_finite() || x < 0.0) {
                return Err(format!("{name} deve ser um valor positivo"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulateLeadResponse {
    pub success: bool,
    pub message: String,
    pub lead_id: String,
    pub data: SimulatedLead,
}
