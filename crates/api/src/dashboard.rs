//! The five headline KPIs, fetched together for one cluster filter.

use serde::Serialize;
use weedle_query::{QueryClient, QueryError, QueryHandle, QueryResult};

use crate::dto::{KpiValue, NpsKpi, ResolutionKpi};
use crate::endpoints::{GetLtvMedio, GetNps, GetTaxaCrossSell, GetTempoMedioResolucao, GetTicketMedio};
use crate::ClusterFilter;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NpsBreakdown {
    pub geral: f64,
    pub relacional: f64,
    pub suporte: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionSummary {
    pub valor: f64,
    pub unidade: String,
    pub descricao: String,
    pub total_tickets: u64,
    pub menor_tempo: f64,
    pub maior_tempo: f64,
}

impl Default for ResolutionSummary {
    fn default() -> Self {
        Self {
            valor: 0.0,
            unidade: "dias".to_string(),
            descricao: String::new(),
            total_tickets: 0,
            menor_tempo: 0.0,
            maior_tempo: 0.0,
        }
    }
}

/// KPI values with zero defaults for anything not loaded yet.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DashboardMetrics {
    pub ltv_medio: f64,
    pub ticket_medio: f64,
    pub taxa_cross_sell: f64,
    pub nps: NpsBreakdown,
    pub tempo_medio_resolucao: ResolutionSummary,
}

impl DashboardMetrics {
    pub fn from_parts(
        ltv: Option<&KpiValue>,
        ticket: Option<&KpiValue>,
        cross_sell: Option<&KpiValue>,
        nps: Option<&NpsKpi>,
        resolution: Option<&ResolutionKpi>,
    ) -> Self {
        let tempo_medio_resolucao = match resolution {
            Some(r) => ResolutionSummary {
                valor: r.valor,
                unidade: if r.unidade.is_empty() { "dias".to_string() } else { r.unidade.clone() },
                descricao: r.descricao.clone(),
                total_tickets: r.detalhes.total_tickets,
                menor_tempo: r.detalhes.menor_tempo,
                maior_tempo: r.detalhes.maior_tempo,
            },
            None => ResolutionSummary::default(),
        };
        Self {
            ltv_medio: ltv.map_or(0.0, |k| k.valor),
            ticket_medio: ticket.map_or(0.0, |k| k.valor),
            taxa_cross_sell: cross_sell.map_or(0.0, |k| k.valor),
            nps: nps
                .map(|n| NpsBreakdown {
                    geral: n.valores.media_nps_geral,
                    relacional: n.valores.media_nps_relacional,
                    suporte: n.valores.media_nps_suporte,
                })
                .unwrap_or_default(),
            tempo_medio_resolucao,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub metrics: DashboardMetrics,
    /// Any KPI still on its first load.
    pub is_loading: bool,
    /// Any KPI fetching, refetches included.
    pub is_fetching: bool,
    pub has_error: bool,
    /// First error among the five, for display.
    #[serde(skip)]
    pub error: Option<QueryError>,
}

/// Live subscriptions to the five KPI queries of one cluster filter.
pub struct MetricsHandle {
    filter: ClusterFilter,
    ltv: QueryHandle<KpiValue>,
    ticket: QueryHandle<KpiValue>,
    cross_sell: QueryHandle<KpiValue>,
    nps: QueryHandle<NpsKpi>,
    resolution: QueryHandle<ResolutionKpi>,
}

impl MetricsHandle {
    pub fn subscribe(client: &QueryClient, filter: ClusterFilter) -> Self {
        Self {
            ltv: client.subscribe::<GetLtvMedio>(&filter),
            ticket: client.subscribe::<GetTicketMedio>(&filter),
            cross_sell: client.subscribe::<GetTaxaCrossSell>(&filter),
            nps: client.subscribe::<GetNps>(&filter),
            resolution: client.subscribe::<GetTempoMedioResolucao>(&filter),
            filter,
        }
    }

    pub fn filter(&self) -> &ClusterFilter { &self.filter }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let ltv = self.ltv.current();
        let ticket = self.ticket.current();
        let cross_sell = self.cross_sell.current();
        let nps = self.nps.current();
        let resolution = self.resolution.current();

        let flags = [
            flags_of(&ltv),
            flags_of(&ticket),
            flags_of(&cross_sell),
            flags_of(&nps),
            flags_of(&resolution),
        ];
        let error = [&ltv.error, &ticket.error, &cross_sell.error, &nps.error, &resolution.error]
            .into_iter()
            .zip(flags.iter())
            .find_map(|(e, f)| if f.2 { e.clone() } else { None });

        MetricsSnapshot {
            metrics: DashboardMetrics::from_parts(
                ltv.data.as_deref(),
                ticket.data.as_deref(),
                cross_sell.data.as_deref(),
                nps.data.as_deref(),
                resolution.data.as_deref(),
            ),
            is_loading: flags.iter().any(|f| f.0),
            is_fetching: flags.iter().any(|f| f.1),
            has_error: flags.iter().any(|f| f.2),
            error,
        }
    }

    /// Wait until none of the five queries is fetching.
    pub async fn settled(&mut self) -> Result<MetricsSnapshot, QueryError> {
        futures::try_join!(
            self.ltv.settled(),
            self.ticket.settled(),
            self.cross_sell.settled(),
            self.nps.settled(),
            self.resolution.settled(),
        )?;
        Ok(self.snapshot())
    }

    /// Returns how many of the five started a new request.
    pub fn refetch(&self) -> usize {
        [
            self.ltv.refetch(),
            self.ticket.refetch(),
            self.cross_sell.refetch(),
            self.nps.refetch(),
            self.resolution.refetch(),
        ]
        .into_iter()
        .filter(|started| *started)
        .count()
    }
}

fn flags_of<T>(r: &QueryResult<T>) -> (bool, bool, bool) { (r.is_loading, r.is_fetching, r.is_error) }
