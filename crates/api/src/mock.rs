use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::dto::*;
use crate::{shape_clusters, ClusterFilter, ClusterView, DashboardMetrics, WeedleApi, WeedleError, WeedleResult};

/// In-memory implementation for tests and offline demos.
#[derive(Debug, Default)]
pub struct MockApi {
    pub clusters: ClusterApiResponse,
    pub metrics: DashboardMetrics,
    pub dashboard: DashboardData,
    pub statistics: Statistics,
    pub report: ReportData,
    /// Returned by every call when set.
    pub fail_with: Option<WeedleError>,
    /// Rows of the NPS analytics table.
    pub nps_analytics: Vec<NpsAnalyticsRow>,
    companies: Mutex<Vec<Company>>,
    leads: Mutex<Vec<SimulatedLead>>,
    // cluster entities; `empresas` is filled from the company list on read
    entities: Mutex<Vec<Cluster>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> { m.lock().unwrap_or_else(PoisonError::into_inner) }

impl MockApi {
    pub fn new() -> Self { Self::default() }

    pub fn with_companies(self, companies: Vec<Company>) -> Self {
        *lock(&self.companies) = companies;
        self
    }

    pub fn with_leads(self, leads: Vec<SimulatedLead>) -> Self {
        *lock(&self.leads) = leads;
        self
    }

    pub fn with_cluster_entities(self, clusters: Vec<Cluster>) -> Self {
        *lock(&self.entities) = clusters;
        self
    }

    pub fn failing(mut self, error: WeedleError) -> Self {
        self.fail_with = Some(error);
        self
    }

    /// A small consistent dataset with the five standard segments.
    pub fn sample() -> Self {
        let rows: [(i64, &str, u64, u64, f64, f64); 5] = [
            (0, "Engajamento Moderado", 312, 980, 4_107_036.0, 7.8),
            (1, "Clientes Inativos", 298, 120, 380_500.0, 5.1),
            (2, "Clientes Premium", 267, 1_420, 9_820_410.5, 9.2),
            (3, "Clientes Neutros", 201, 230, 702_300.0, 6.9),
            (4, "Clientes Críticos", 169, 0, 0.0, 3.4),
        ];
        let clusters = rows
            .iter()
            .map(|&(id, name, clients, contracts, total, nps)| ClusterSummary {
                cluster_id: id,
                descricao: name.to_string(),
                n_clients: clients,
                qtd_contratos: contracts,
                valor_total_contratado: total,
                media_nps: nps,
                qtd_avaliacoes_nps: clients / 2,
                total_tickets_abertos: (clients * 3) / 10,
                media_dias_resolucao_ticket: 2.5 + id as f64,
                ..ClusterSummary::default()
            })
            .collect();
        let companies = (1..=12)
            .map(|i| Company {
                id: i.to_string(),
                cnpj: format!("{:02}.345.678/0001-{:02}", i, 90 - i),
                nome_empresa: format!("Empresa {i:02} Ltda"),
                segmento: ["Varejo", "Serviços", "Indústria"][i % 3].to_string(),
                capital_social: 50_000.0 * i as f64,
                email: format!("contato{i}@empresa{i}.com.br"),
                produto: ["Crédito", "Seguro", "Consórcio"][i % 3].to_string(),
                valor_contrato: 12_500.0 * i as f64,
                cluster: (i % 5).to_string(),
                data_simulacao: format!("2025-01-{:02}", i),
            })
            .collect();
        let metrics = DashboardMetrics {
            ltv_medio: 48_250.0,
            ticket_medio: 3_970.5,
            taxa_cross_sell: 1.11,
            nps: crate::dashboard::NpsBreakdown { geral: 7.4, relacional: 7.9, suporte: 6.8 },
            tempo_medio_resolucao: crate::dashboard::ResolutionSummary {
                valor: 3.2,
                total_tickets: 355,
                menor_tempo: 0.5,
                maior_tempo: 14.0,
                ..Default::default()
            },
        };
        let entities = rows
            .iter()
            .map(|&(id, name, ..)| Cluster { id: id.to_string(), nome: name.to_string(), ..Cluster::default() })
            .collect();
        Self { clusters: ClusterApiResponse { clusters }, metrics, nps_analytics: sample_nps_analytics(), ..Self::default() }
            .with_companies(companies)
            .with_cluster_entities(entities)
    }

    fn cluster_not_found(id: &str) -> WeedleError { WeedleError::NotFound(format!("Cluster {id} não encontrado")) }

    fn check(&self) -> WeedleResult<()> {
        match &self.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn lead_cluster(&self, lead: &SimulateLeadRequest) -> String {
        // Larger contracts land in the richer segments
        let value = lead.valor_contrato.or(lead.capital_social).unwrap_or(0.0);
        let wanted = if value >= 100_000.0 { 2 } else if value >= 10_000.0 { 0 } else { 3 };
        self.clusters
            .clusters
            .iter()
            .find(|c| c.cluster_id == wanted)
            .or_else(|| self.clusters.clusters.first())
            .map(|c| c.descricao.clone())
            .unwrap_or_default()
    }
}

/// Per-client NPS answers as the analytics page lists them.
pub fn sample_nps_analytics() -> Vec<NpsAnalyticsRow> {
    let clients: [(&str, &str, &str, &str, f64, f64); 3] = [
        ("TEZMHC", "VAREJO", "MAGAZINE E LOJA DE DEPARTAMENTOS", "Faixa 02 - De 7,5 M ate 15 M", 4_107_036.0, 1.11),
        ("TEZM89", "LOGISTICA", "TRANSPORTADOR", "Faixa 07 - De 75 M ate 150 M", 4_027_219.0, 0.88),
        ("TEZMFC", "SERVICOS", "PROVEDOR SERVICOS", "Faixa 03 - De 15 M ate 25 M", 4_018_639.0, 0.75),
    ];
    let answers: [(usize, &str, f64); 7] = [
        (0, "DETRATOR", 3.04),
        (0, "NEUTRO", 7.79),
        (0, "PROMOTOR", 9.82),
        (1, "DETRATOR", 1.80),
        (1, "NEUTRO", 7.50),
        (1, "PROMOTOR", 10.0),
        (2, "DETRATOR", 1.00),
    ];
    answers
        .iter()
        .map(|&(client, class, score)| {
            let (cd, seg, sub, band, value, discount) = clients[client];
            NpsAnalyticsRow {
                cd_cliente: cd.to_string(),
                segmento: seg.to_string(),
                subsegmento: sub.to_string(),
                faixa_faturamento: band.to_string(),
                situacao_contrato: "ATIVO".to_string(),
                valor_total_contrato: value,
                percentual_desconto: discount,
                media_resolucao_ticket: None,
                classificacao_nps: class.to_string(),
                nota_media: score,
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl WeedleApi for MockApi {
    async fn clusters(&self) -> WeedleResult<Vec<ClusterView>> {
        self.check()?;
        Ok(shape_clusters(&self.clusters))
    }

    async fn metrics(&self, _filter: &ClusterFilter) -> WeedleResult<DashboardMetrics> {
        self.check()?;
        Ok(self.metrics.clone())
    }

    async fn dashboard(&self) -> WeedleResult<DashboardData> {
        self.check()?;
        Ok(self.dashboard.clone())
    }

    async fn statistics(&self) -> WeedleResult<Statistics> {
        self.check()?;
        Ok(self.statistics.clone())
    }

    async fn companies(&self) -> WeedleResult<Vec<Company>> {
        self.check()?;
        Ok(lock(&self.companies).clone())
    }

    async fn company(&self, id: &str) -> WeedleResult<Company> {
        self.check()?;
        lock(&self.companies)
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| WeedleError::NotFound(format!("Empresa {id} não encontrada")))
    }

    async fn companies_by_cluster(&self, cluster_id: &str) -> WeedleResult<Vec<Company>> {
        self.check()?;
        Ok(lock(&self.companies).iter().filter(|c| c.cluster == cluster_id).cloned().collect())
    }

    async fn companies_report(&self) -> WeedleResult<ReportData> {
        self.check()?;
        Ok(self.report.clone())
    }

    async fn leads(&self, filters: &LeadFilters) -> WeedleResult<LeadsResponse> {
        self.check()?;
        let all = lock(&self.leads);
        let matched: Vec<&SimulatedLead> = all.iter().filter(|l| filters.matches(l)).collect();
        let offset = filters.offset.unwrap_or(0);
        let page = matched
            .iter()
            .skip(offset as usize)
            .take(filters.limit.map_or(usize::MAX, |l| l as usize))
            .map(|l| (*l).clone())
            .collect();
        Ok(LeadsResponse {
            leads: page,
            total: matched.len() as u64,
            limit: filters.limit,
            offset,
            filtros: LeadFilters { limit: None, offset: None, ..filters.clone() },
        })
    }

    async fn simulate_lead(&self, lead: SimulateLeadRequest) -> WeedleResult<SimulateLeadResponse> {
        self.check()?;
        lead.validate().map_err(WeedleError::Validation)?;
        let data = SimulatedLead {
            cluster_name: self.lead_cluster(&lead),
            cnpj: lead.cnpj,
            nome_empresa: lead.nome_empresa,
            segmento: lead.segmento,
            capital_social: lead.capital_social.unwrap_or(0.0),
            email: lead.email,
            produto: lead.produto,
            valor_contrato: lead.valor_contrato.unwrap_or(0.0),
            data_simulacao: chrono::Local::now().date_naive().format("%Y-%m-%d").to_string(),
        };
        let mut leads = lock(&self.leads);
        leads.push(data.clone());
        let lead_id = format!("lead-{}", leads.len());
        debug!(lead_id = %lead_id, cluster = %data.cluster_name, "mock: lead simulated");
        Ok(SimulateLeadResponse { success: true, message: "Lead simulado com sucesso".to_string(), lead_id, data })
    }

    async fn create_company(&self, company: CompanyPatch) -> WeedleResult<Company> {
        self.check()?;
        let mut all = lock(&self.companies);
        let next_id = all.iter().filter_map(|c| c.id.parse::<u64>().ok()).max().unwrap_or(0) + 1;
        let mut created = Company { id: next_id.to_string(), ..Company::default() };
        company.apply_to(&mut created);
        if created.nome_empresa.trim().is_empty() {
            return Err(WeedleError::Validation("nomeEmpresa é obrigatório".to_string()));
        }
        all.push(created.clone());
        Ok(created)
    }

    async fn update_company(&self, id: &str, updates: CompanyPatch) -> WeedleResult<Company> {
        self.check()?;
        let mut all = lock(&self.companies);
        let Some(c) = all.iter_mut().find(|c| c.id == id) else {
            return Err(WeedleError::NotFound(format!("Empresa {id} não encontrada")));
        };
        updates.apply_to(c);
        Ok(c.clone())
    }

    async fn delete_company(&self, id: &str) -> WeedleResult<()> {
        self.check()?;
        let mut all = lock(&self.companies);
        let before = all.len();
        all.retain(|c| c.id != id);
        if all.len() == before {
            return Err(WeedleError::NotFound(format!("Empresa {id} não encontrada")));
        }
        Ok(())
    }

    async fn cluster(&self, id: &str) -> WeedleResult<Cluster> {
        self.check()?;
        let mut found = lock(&self.entities).iter().find(|c| c.id == id).cloned().ok_or_else(|| Self::cluster_not_found(id))?;
        found.empresas = lock(&self.companies).iter().filter(|c| c.cluster == id).cloned().collect();
        Ok(found)
    }

    async fn create_cluster(&self, cluster: ClusterPatch) -> WeedleResult<Cluster> {
        self.check()?;
        let mut all = lock(&self.entities);
        let next_id = all.iter().filter_map(|c| c.id.parse::<u64>().ok()).max().map_or(0, |m| m + 1);
        let mut created = Cluster { id: next_id.to_string(), ..Cluster::default() };
        cluster.apply_to(&mut created);
        if created.nome.trim().is_empty() {
            return Err(WeedleError::Validation("nome é obrigatório".to_string()));
        }
        all.push(created.clone());
        debug!(id = %created.id, "mock: cluster created");
        Ok(created)
    }

    async fn update_cluster(&self, id: &str, updates: ClusterPatch) -> WeedleResult<Cluster> {
        self.check()?;
        let mut all = lock(&self.entities);
        let Some(c) = all.iter_mut().find(|c| c.id == id) else {
            return Err(Self::cluster_not_found(id));
        };
        updates.apply_to(c);
        Ok(c.clone())
    }

    async fn delete_cluster(&self, id: &str) -> WeedleResult<()> {
        self.check()?;
        let mut all = lock(&self.entities);
        let before = all.len();
        all.retain(|c| c.id != id);
        if all.len() == before {
            return Err(Self::cluster_not_found(id));
        }
        Ok(())
    }
}
