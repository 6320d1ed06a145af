#![forbid(unsafe_code)]

use std::time::Duration;

use weedle_api::{
    sample_nps_analytics, ClusterFilter, ClusterPatch, Company, NpsAnalyticsRow, CompanyPatch, LeadFilters, MockApi, SessionStore, SimulateLeadRequest, SimulatedLead,
    WeedleApi, WeedleError,
};
use weedle_core::columns::{
    COMPANY_CONTRACT_VALUE, COMPANY_EMAIL, COMPANY_SIMULATED_AT, LEAD_CAPITAL, LEAD_EMAIL, NPS_AVG_SCORE, NPS_CONTRACT_VALUE,
    NPS_DISCOUNT, NPS_TICKET_RESOLUTION,
};
use weedle_core::{builtin_columns_for, CellValue, Record, TableKind};
use weedle_table::{DataTable, TableConfig};

fn lead(name: &str, value: f64) -> SimulateLeadRequest {
    SimulateLeadRequest {
        cnpj: "12345678000190".into(),
        nome_empresa: name.into(),
        segmento: "Varejo".into(),
        email: "a@b.co".into(),
        produto: "Seguro".into(),
        valor_contrato: Some(value),
        ..SimulateLeadRequest::default()
    }
}

#[tokio::test]
async fn sample_has_the_five_segments() {
    let api = MockApi::sample();
    let clusters = api.clusters().await.unwrap();
    let names: Vec<&str> = clusters.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Engajamento Moderado", "Clientes Inativos", "Clientes Premium", "Clientes Neutros", "Clientes Críticos"]
    );
    assert_eq!(clusters[4].frequency, "0x/mês");
    assert_eq!(clusters[4].avg_ticket, "R$ 0,00");

    let metrics = api.metrics(&ClusterFilter::All).await.unwrap();
    assert_eq!(metrics.tempo_medio_resolucao.unidade, "dias");
    assert_eq!(api.companies().await.unwrap().len(), 12);
    assert_eq!(api.companies_by_cluster("2").await.unwrap().len(), 3);
}

#[tokio::test]
async fn company_crud() {
    let api = MockApi::sample();
    assert_eq!(api.company("3").await.unwrap().nome_empresa, "Empresa 03 Ltda");
    assert!(matches!(api.company("404").await, Err(WeedleError::NotFound(_))));

    let created = api
        .create_company(CompanyPatch { nome_empresa: Some("Nova".into()), ..CompanyPatch::default() })
        .await
        .unwrap();
    assert_eq!(created.id, "13");
    assert!(matches!(api.create_company(CompanyPatch::default()).await, Err(WeedleError::Validation(_))));

    let updated = api
        .update_company("13", CompanyPatch { segmento: Some("Indústria".into()), ..CompanyPatch::default() })
        .await
        .unwrap();
    assert_eq!((updated.nome_empresa.as_str(), updated.segmento.as_str()), ("Nova", "Indústria"));
    assert!(api.update_company("99", CompanyPatch::default()).await.is_err());

    api.delete_company("13").await.unwrap();
    assert_eq!(api.delete_company("13").await, Err(WeedleError::NotFound("Empresa 13 não encontrada".into())));
    assert_eq!(api.companies().await.unwrap().len(), 12);
}

#[tokio::test]
async fn simulated_leads_are_listed() {
    let api = MockApi::sample();
    let big = api.simulate_lead(lead("Grande", 500_000.0)).await.unwrap();
    assert!(big.success);
    assert_eq!(big.lead_id, "lead-1");
    assert_eq!(big.data.cluster_name, "Clientes Premium");
    assert_eq!(big.data.data_simulacao.len(), 10);
    let small = api.simulate_lead(lead("Pequena", 500.0)).await.unwrap();
    assert_eq!(small.lead_id, "lead-2");
    assert_eq!(small.data.cluster_name, "Clientes Neutros");

    let bad = SimulateLeadRequest { email: "sem-arroba".into(), ..lead("X", 1.0) };
    assert!(matches!(api.simulate_lead(bad).await, Err(WeedleError::Validation(_))));

    let all = api.leads(&LeadFilters::default()).await.unwrap();
    assert_eq!(all.total, 2);

    let premium = LeadFilters { cluster_name: Some("clientes premium".into()), ..LeadFilters::default() };
    let resp = api.leads(&premium).await.unwrap();
    assert_eq!(resp.total, 1);
    assert_eq!(resp.leads[0].nome_empresa, "Grande");

    let paged = api.leads(&LeadFilters { limit: Some(1), offset: Some(1), ..LeadFilters::default() }).await.unwrap();
    assert_eq!((paged.total, paged.leads.len(), paged.offset), (2, 1, 1));
    assert_eq!(paged.leads[0].nome_empresa, "Pequena");
    assert_eq!(paged.filtros.limit, None);
}

#[tokio::test]
async fn failure_injection() {
    let api = MockApi::sample().failing(WeedleError::Unavailable("fora do ar".into()));
    assert_eq!(api.clusters().await.unwrap_err().message(), "fora do ar");
    assert!(api.statistics().await.is_err());
}

#[test]
fn company_and_lead_rows() {
    let company = Company {
        nome_empresa: "Alfa".into(),
        valor_contrato: 1234.5,
        data_simulacao: "2025-01-15".into(),
        ..Company::default()
    };
    assert_eq!(company.field(COMPANY_CONTRACT_VALUE), CellValue::Markup("R$ 1.234,50".into()));
    assert_eq!(company.field(COMPANY_SIMULATED_AT).display(), "15/01/2025");
    assert_eq!(company.field("nope"), CellValue::Empty);

    let lead = SimulatedLead { capital_social: 50_000.0, email: "x@y.com".into(), ..SimulatedLead::default() };
    assert_eq!(lead.field(LEAD_CAPITAL).display(), "R$ 50.000,00");
    assert_eq!(lead.field(LEAD_EMAIL).display(), "x@y.com");
    assert_eq!(lead.values().len(), 9);

    let table = DataTable::new(vec![company], builtin_columns_for(TableKind::Companies), TableConfig::titled("Empresas"))
        .unwrap();
    assert!(table.render_text().contains("R$ 1.234,50"));
}

#[test]
fn company_search_covers_hidden_fields() {
    let companies = vec![
        Company {
            id: "77".into(),
            nome_empresa: "Acme Comércio".into(),
            cnpj: "11.222.333/0001-44".into(),
            email: "contato@acme.com.br".into(),
            capital_social: 2_500_000.0,
            ..Company::default()
        },
        Company {
            id: "12".into(),
            nome_empresa: "Beta Serviços".into(),
            cnpj: "55.666.888/0001-99".into(),
            email: "vendas@beta.com.br".into(),
            ..Company::default()
        },
    ];
    assert_eq!(companies[0].field(COMPANY_EMAIL).display(), "contato@acme.com.br");
    let mut table =
        DataTable::new(companies, builtin_columns_for(TableKind::Companies), TableConfig::titled("Empresas")).unwrap();

    for term in ["acme.com.br", "77", "2.500.000"] {
        table.set_search(term);
        assert_eq!(table.total_results(), 1, "{term}");
        assert_eq!(table.rows().next().map(|c| c.id.as_str()), Some("77"), "{term}");
    }
    table.set_search("@");
    assert_eq!(table.total_results(), 2);
}

#[tokio::test]
async fn cluster_entities() {
    let api = MockApi::sample();
    let premium = api.cluster("2").await.unwrap();
    assert_eq!(premium.nome, "Clientes Premium");
    let ids: Vec<&str> = premium.empresas.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "7", "12"]);

    let created = api.create_cluster(ClusterPatch { nome: Some("Novos Clientes".into()), descricao: None }).await.unwrap();
    assert_eq!(created.id, "5");
    assert!(created.empresas.is_empty());
    let blank = api.create_cluster(ClusterPatch::default()).await.unwrap_err();
    assert!(matches!(blank, WeedleError::Validation(_)));

    let patch = ClusterPatch { descricao: Some("Recém-chegados".into()), ..ClusterPatch::default() };
    let updated = api.update_cluster("5", patch).await.unwrap();
    assert_eq!((updated.nome.as_str(), updated.descricao.as_deref()), ("Novos Clientes", Some("Recém-chegados")));

    api.delete_cluster("5").await.unwrap();
    let gone = api.cluster("5").await.unwrap_err();
    assert_eq!(gone, WeedleError::NotFound("Cluster 5 não encontrado".into()));
    assert!(matches!(api.update_cluster("5", ClusterPatch::default()).await, Err(WeedleError::NotFound(_))));
    assert!(matches!(api.delete_cluster("5").await, Err(WeedleError::NotFound(_))));
}

#[test]
fn nps_analytics_table() {
    let rows = sample_nps_analytics();
    assert_eq!(rows.len(), 7);
    assert_eq!(MockApi::sample().nps_analytics, rows);

    let first = &rows[0];
    assert_eq!(first.field(NPS_CONTRACT_VALUE), CellValue::Markup("R$ 4.107.036".into()));
    assert_eq!(first.field(NPS_DISCOUNT).display(), "1,11%");
    assert_eq!(first.field(NPS_AVG_SCORE).display(), "3,04");
    assert_eq!(first.field(NPS_TICKET_RESOLUTION), CellValue::Empty);
    assert_eq!(first.values().len(), 10);

    let mut table =
        DataTable::new(rows, builtin_columns_for(TableKind::NpsAnalytics), TableConfig::titled("Analítico NPS")).unwrap();
    table.set_search("promotor");
    assert_eq!(table.total_results(), 2);
    table.set_search("transportador");
    assert_eq!(table.total_results(), 3);
    table.set_search("");
    assert!(table.click_header("cdCliente"));
    let first_client = table.rows().next().map(|r| r.cd_cliente.clone());
    assert_eq!(first_client.as_deref(), Some("TEZM89"));
    assert!(table.render_text().contains("MAGAZINE"));
}

#[test]
fn nps_rows_read_the_page_json() {
    let row: NpsAnalyticsRow = serde_json::from_value(serde_json::json!({
        "cdCliente": "TEZMFC",
        "classificacaoNPS": "DETRATOR",
        "notaMedia": 1.0,
        "mediaResolucaoTicket": 4.5
    }))
    .unwrap();
    assert_eq!(row.classificacao_nps, "DETRATOR");
    assert_eq!(row.field(NPS_TICKET_RESOLUTION).display(), "4,5");
    assert_eq!(row.situacao_contrato, "");
}

#[tokio::test(start_paused = true)]
async fn first_visit_delay_applies_once() {
    let session = SessionStore::new();
    let delay = Duration::from_millis(800);
    assert_eq!(session.first_visit_delay("clusters", delay), Some(delay));

    let t0 = tokio::time::Instant::now();
    assert!(session.first_visit("clusters", delay).await);
    assert!(t0.elapsed() >= delay);
    assert!(session.is_loaded("clusters"));

    let t1 = tokio::time::Instant::now();
    assert!(!session.first_visit("clusters", delay).await);
    assert_eq!(t1.elapsed(), Duration::ZERO);

    // clones share the set
    let other = session.clone();
    assert!(!other.mark_loaded("clusters"));
    assert!(other.mark_loaded("leads"));
    assert_eq!(session.len(), 2);
    session.clear();
    assert!(other.is_empty());
}
