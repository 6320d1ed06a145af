//! Shaping of raw cluster aggregates into the rows the dashboard shows.

use serde::Serialize;
use weedle_core::columns::{
    CLUSTER_ACTIONS, CLUSTER_AVG_TICKET, CLUSTER_BEHAVIOUR, CLUSTER_CLIENTS, CLUSTER_COLOR, CLUSTER_CONTRACTS,
    CLUSTER_DISCOUNT, CLUSTER_FREQUENCY, CLUSTER_ID, CLUSTER_KEYWORDS, CLUSTER_NAME, CLUSTER_NPS, CLUSTER_NPS_REVIEWS,
    CLUSTER_NUMERIC_ID, CLUSTER_OPEN_TICKETS, CLUSTER_RESOLUTION_DAYS, CLUSTER_TOTAL_CONTRACTED,
};
use weedle_core::format::{format_currency, format_currency_whole};
use weedle_core::{CellValue, Record};

use crate::dto::{ClusterApiResponse, ClusterSummary};

/// Palette indexed by cluster id.
pub const CLUSTER_COLORS: [&str; 5] = ["#F59E0B", "#8B5CF6", "#10B981", "#06B6D4", "#EF4444"];

pub const NO_BEHAVIOUR: &str = "Análise comportamental não disponível";

static KEYWORDS: [[&str; 8]; 5] = [
    [
        "COMPRAS FREQUENTES",
        "TICKET ALTO",
        "FIDELIDADE",
        "PRODUTOS PREMIUM",
        "ATENDIMENTO VIP",
        "ENTREGAS RÁPIDAS",
        "DESCONTOS EXCLUSIVOS",
        "SUPORTE PRIORITÁRIO",
    ],
    [
        "COMPRAS REGULARES",
        "TICKET MÉDIO",
        "PRODUTOS BÁSICOS",
        "PROMOÇÕES",
        "ATENDIMENTO PADRÃO",
        "ENTREGAS NORMAIS",
        "CUPONS",
        "CAMPANHAS",
    ],
    [
        "COMPRAS OCASIONAIS",
        "TICKET BAIXO",
        "PRODUTOS BÁSICOS",
        "OFERTAS",
        "ATENDIMENTO BÁSICO",
        "ENTREGAS PADRÃO",
        "DESCONTOS",
        "REATIVAÇÃO",
    ],
    [
        "PRIMEIRA COMPRA",
        "ONBOARDING",
        "PRODUTOS INICIAIS",
        "BEM-VINDO",
        "ATENDIMENTO ESPECIAL",
        "ENTREGAS RÁPIDAS",
        "DESCONTO INICIAL",
        "ACOMPANHAMENTO",
    ],
    [
        "COMPRAS CORPORATIVAS",
        "TICKET ALTO",
        "CONTRATOS",
        "ATENDIMENTO DEDICADO",
        "ENTREGAS PROGRAMADAS",
        "DESCONTOS VOLUME",
        "SUPORTE TÉCNICO",
        "RELACIONAMENTO",
    ],
];

/// Contract frequency bucket from contracts per client.
pub fn frequency_bucket(contracts: u64, clients: u64) -> &'static str {
    if contracts == 0 {
        return "0x/mês";
    }
    // no clients with contracts counts as the top bucket
    let avg = if clients == 0 { f64::INFINITY } else { contracts as f64 / clients as f64 };
    if avg >= 5.0 {
        "5x/semana"
    } else if avg >= 3.0 {
        "3x/semana"
    } else if avg >= 2.0 {
        "2x/semana"
    } else if avg >= 1.0 {
        "1x/semana"
    } else {
        "1x/mês"
    }
}

/// Average contract value as BRL, `R$ 0,00` without contracts.
pub fn average_ticket(total_contracted: f64, contracts: u64) -> String {
    if contracts == 0 {
        return format_currency(0.0);
    }
    format_currency(total_contracted / contracts as f64)
}

pub fn cluster_color(cluster_id: i64, position: usize) -> &'static str {
    usize::try_from(cluster_id)
        .ok()
        .and_then(|i| CLUSTER_COLORS.get(i).copied())
        .unwrap_or(CLUSTER_COLORS[position % CLUSTER_COLORS.len()])
}

pub fn cluster_keywords(cluster_id: i64) -> &'static [&'static str] {
    usize::try_from(cluster_id).ok().and_then(|i| KEYWORDS.get(i)).map(|k| &k[..]).unwrap_or(&[])
}

/// One cluster as the dashboard renders it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterView {
    /// `cluster-<id>`
    pub id: String,
    pub cluster_id: i64,
    pub name: String,
    pub behaviour: String,
    pub actions: Vec<String>,
    pub color: &'static str,
    pub keywords: &'static [&'static str],
    pub clients: u64,
    pub avg_ticket: String,
    pub frequency: &'static str,
    pub contracts: u64,
    pub total_contracted: String,
    pub total_contracted_value: f64,
    pub open_tickets: u64,
    pub discount_granted: f64,
    pub nps: f64,
    pub nps_reviews: u64,
    pub resolution_days: f64,
}

impl ClusterView {
    pub fn from_summary(c: &ClusterSummary, position: usize) -> Self {
        Self {
            id: format!("cluster-{}", c.cluster_id),
            cluster_id: c.cluster_id,
            name: c.descricao.clone(),
            behaviour: c.comportamento.clone().filter(|s| !s.trim().is_empty()).unwrap_or_else(|| NO_BEHAVIOUR.to_string()),
            actions: c.acoes.iter().map(|a| a.acao.clone()).filter(|a| !a.is_empty()).collect(),
            color: cluster_color(c.cluster_id, position),
            keywords: cluster_keywords(c.cluster_id),
            clients: c.n_clients,
            avg_ticket: average_ticket(c.valor_total_contratado, c.qtd_contratos),
            frequency: frequency_bucket(c.qtd_contratos, c.n_clients),
            contracts: c.qtd_contratos,
            total_contracted: format_currency_whole(c.valor_total_contratado),
            total_contracted_value: c.valor_total_contratado,
            open_tickets: c.total_tickets_abertos,
            discount_granted: c.total_desconto_concedido,
            nps: c.media_nps,
            nps_reviews: c.qtd_avaliacoes_nps,
            resolution_days: c.media_dias_resolucao_ticket,
        }
    }
}

pub fn shape_clusters(resp: &ClusterApiResponse) -> Vec<ClusterView> {
    resp.clusters.iter().enumerate().map(|(i, c)| ClusterView::from_summary(c, i)).collect()
}

impl Record for ClusterView {
    fn field(&self, key: &str) -> CellValue {
        match key {
            CLUSTER_NAME => self.name.as_str().into(),
            CLUSTER_CLIENTS => self.clients.into(),
            CLUSTER_AVG_TICKET => CellValue::Markup(self.avg_ticket.clone()),
            CLUSTER_FREQUENCY => self.frequency.into(),
            CLUSTER_CONTRACTS => self.contracts.into(),
            CLUSTER_TOTAL_CONTRACTED => CellValue::Markup(self.total_contracted.clone()),
            CLUSTER_NPS => self.nps.into(),
            CLUSTER_OPEN_TICKETS => self.open_tickets.into(),
            CLUSTER_RESOLUTION_DAYS => self.resolution_days.into(),
            CLUSTER_ID => self.id.as_str().into(),
            CLUSTER_NUMERIC_ID => self.cluster_id.into(),
            CLUSTER_BEHAVIOUR => self.behaviour.as_str().into(),
            CLUSTER_ACTIONS => self.actions.join("; ").into(),
            CLUSTER_COLOR => self.color.into(),
            CLUSTER_KEYWORDS => self.keywords.join(", ").into(),
            CLUSTER_DISCOUNT => self.discount_granted.into(),
            CLUSTER_NPS_REVIEWS => self.nps_reviews.into(),
            _ => CellValue::Empty,
        }
    }

    fn values(&self) -> Vec<CellValue> {
        [
            CLUSTER_ID,
            CLUSTER_NUMERIC_ID,
            CLUSTER_NAME,
            CLUSTER_BEHAVIOUR,
            CLUSTER_ACTIONS,
            CLUSTER_COLOR,
            CLUSTER_KEYWORDS,
            CLUSTER_CLIENTS,
            CLUSTER_AVG_TICKET,
            CLUSTER_FREQUENCY,
            CLUSTER_CONTRACTS,
            CLUSTER_TOTAL_CONTRACTED,
            CLUSTER_DISCOUNT,
            CLUSTER_NPS,
            CLUSTER_NPS_REVIEWS,
            CLUSTER_OPEN_TICKETS,
            CLUSTER_RESOLUTION_DAYS,
        ]
        .iter()
        .map(|k| self.field(k))
        .collect()
    }
}
