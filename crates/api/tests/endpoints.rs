#![forbid(unsafe_code)]

use serde_json::json;
use weedle_api::endpoints::*;
use weedle_api::{
    ClusterFilter, ClusterPatch, CompanyPatch, LeadFilters, SimulateLeadRequest, WeedleError, CLUSTER, COMPANY, DASHBOARD,
};
use weedle_query::{CacheKey, Method, Mutation, Params, Query, QueryError, RetryTier, Tag, TransportError};

fn key<Q: Query>(args: &Q::Args) -> String { CacheKey::new(Q::NAME, Q::params(args)).to_string() }

#[test]
fn cluster_filter_parsing() {
    assert_eq!("".parse::<ClusterFilter>().unwrap(), ClusterFilter::All);
    assert_eq!("ALL".parse::<ClusterFilter>().unwrap(), ClusterFilter::All);
    assert_eq!(" 3 ".parse::<ClusterFilter>().unwrap(), ClusterFilter::Id("3".into()));
    assert_eq!(ClusterFilter::All.to_string(), "all");
    assert_eq!(ClusterFilter::Id("3".into()).to_string(), "3");
    assert_eq!(ClusterFilter::default().id(), None);
    assert_eq!(ClusterFilter::All.scope(), "all");
    assert_eq!(ClusterFilter::Id("8123".into()).scope(), "cluster");
}

#[test]
fn kpi_requests_carry_the_filter() {
    let all = GetNps::request(&ClusterFilter::All);
    assert_eq!(all.method, Method::Get);
    assert_eq!(all.path, "/dashboard/nps");
    assert!(all.query.is_empty());

    let one = GetLtvMedio::request(&ClusterFilter::Id("2".into()));
    assert_eq!(one.path, "/dashboard/ltv-medio");
    assert_eq!(one.query, vec![("cluster_id".to_string(), "2".to_string())]);

    assert_eq!(key::<GetTicketMedio>(&ClusterFilter::All), "ticket_medio");
    assert_eq!(key::<GetTicketMedio>(&ClusterFilter::Id("2".into())), "ticket_medio?cluster_id=2");
    assert_ne!(key::<GetTicketMedio>(&ClusterFilter::All), key::<GetTaxaCrossSell>(&ClusterFilter::All));

    assert_eq!(GetTempoMedioResolucao::TIER, RetryTier::Critical);
    assert_eq!(GetTaxaCrossSell::provides(&ClusterFilter::All), vec![Tag::kind(DASHBOARD)]);
}

#[test]
fn tiers() {
    assert_eq!(GetClusters::TIER, RetryTier::Critical);
    assert_eq!(GetLeads::TIER, RetryTier::Critical);
    assert_eq!(GetCompanies::TIER, RetryTier::Normal);
    assert_eq!(GetCompanyById::TIER, RetryTier::Normal);
    assert_eq!(SimulateLead::TIER, RetryTier::Light);
    assert_eq!(DeleteCompany::TIER, RetryTier::Normal);
}

#[test]
fn lead_params_are_normalized() {
    let f = LeadFilters { produto: Some("Seguro".into()), limit: Some(10), ..LeadFilters::default() };
    assert_eq!(key::<GetLeads>(&f), "leads?limit=10&produto=Seguro");
    assert_eq!(key::<GetLeads>(&LeadFilters::default()), "leads");

    let req = GetLeads::request(&f);
    assert_eq!(req.path, "/leads");
    assert!(req.query.contains(&("produto".to_string(), "Seguro".to_string())));
    assert!(req.query.contains(&("limit".to_string(), "10".to_string())));
    assert_eq!(req.query.len(), 2);
}

#[test]
fn company_tags() {
    let id = "7".to_string();
    assert_eq!(GetCompanyById::request(&id).path, "/empresas/7");
    assert_eq!(GetCompanyById::provides(&id), vec![Tag::with_id(COMPANY, "7")]);
    assert_eq!(GetCompaniesByCluster::request(&"2".to_string()).path, "/clusters/2/empresas");
    assert!(GetCompaniesByCluster::provides(&"2".to_string()).contains(&Tag::with_id(COMPANY, LIST_ID)));

    // a company update hits that company only, kind-wide providers excepted
    let update = UpdateCompany::invalidates(&(id.clone(), CompanyPatch::default()));
    assert!(GetCompanyById::provides(&id).iter().any(|t| update.iter().any(|u| t.matches(u))));
    assert!(!GetCompanyById::provides(&"8".to_string()).iter().any(|t| update.iter().any(|u| t.matches(u))));
    assert!(!GetLeads::provides(&LeadFilters::default()).iter().any(|t| update.iter().any(|u| t.matches(u))));
}

#[test]
fn cluster_crud_tags() {
    let two = "2".to_string();
    assert_eq!(GetClusterById::request(&two).path, "/clusters/2");
    assert_eq!(key::<GetClusterById>(&two), "cluster?id=2");
    assert_eq!(GetClusterById::provides(&two), vec![Tag::with_id(CLUSTER, "2")]);

    let hits = |inv: &[Tag], provided: &[Tag]| provided.iter().any(|t| inv.iter().any(|u| t.matches(u)));
    let by_cluster = |id: &str| GetCompaniesByCluster::provides(&id.to_string());

    let update = UpdateCluster::invalidates(&(two.clone(), ClusterPatch::default()));
    assert_eq!(update, vec![Tag::with_id(CLUSTER, "2")]);
    assert!(hits(&update, &by_cluster("2")));
    assert!(!hits(&update, &by_cluster("3")));
    assert!(!hits(&update, &GetCompanies::provides(&())));

    for inv in [CreateCluster::invalidates(&ClusterPatch::default()), DeleteCluster::invalidates(&two)] {
        assert_eq!(inv, vec![Tag::kind(CLUSTER)]);
        assert!(hits(&inv, &by_cluster("3")));
        assert!(hits(&inv, &GetClusterById::provides(&"9".to_string())));
    }

    let req = CreateCluster::request(&ClusterPatch { nome: Some("Novos".into()), descricao: None });
    assert_eq!((req.method, req.path.as_str()), (Method::Post, "/clusters"));
    assert_eq!(req.body, Some(json!({ "nome": "Novos" })));
    let req = UpdateCluster::request(&(two.clone(), ClusterPatch { descricao: Some("Alto valor".into()), nome: None }));
    assert_eq!((req.method, req.path.as_str()), (Method::Put, "/clusters/2"));
    assert_eq!(req.body, Some(json!({ "descricao": "Alto valor" })));
    assert_eq!(DeleteCluster::request(&two).method, Method::Delete);
    assert_eq!(CreateCluster::TIER, RetryTier::Normal);
}

#[test]
fn mutation_requests() {
    let lead = SimulateLeadRequest { nome_empresa: "Acme".into(), ..SimulateLeadRequest::default() };
    let req = SimulateLead::request(&lead);
    assert_eq!((req.method, req.path.as_str()), (Method::Post, "/simular-leads"));
    assert_eq!(req.body.as_ref().and_then(|b| b.get("nome_empresa")), Some(&json!("Acme")));
    assert_eq!(SimulateLead::invalidates(&lead), vec![Tag::kind(COMPANY), Tag::kind(DASHBOARD)]);

    let patch = CompanyPatch { nome_empresa: Some("Nova".into()), ..CompanyPatch::default() };
    let req = UpdateCompany::request(&("3".to_string(), patch));
    assert_eq!((req.method, req.path.as_str()), (Method::Put, "/empresas/3"));
    assert_eq!(req.body, Some(json!({ "nomeEmpresa": "Nova" })));

    let req = DeleteCompany::request(&"3".to_string());
    assert_eq!((req.method, req.path.as_str(), req.body), (Method::Delete, "/empresas/3", None));
}

#[test]
fn lead_validation() {
    let ok = SimulateLeadRequest {
        cnpj: "12.345.678/0001-90".into(),
        nome_empresa: "Acme".into(),
        email: "contato@acme.com.br".into(),
        capital_social: Some(10_000.0),
        ..SimulateLeadRequest::default()
    };
    assert_eq!(ok.validate(), Ok(()));

    let missing_name = SimulateLeadRequest { nome_empresa: "  ".into(), ..ok.clone() };
    assert!(missing_name.validate().is_err());
    let short_cnpj = SimulateLeadRequest { cnpj: "123".into(), ..ok.clone() };
    assert!(short_cnpj.validate().unwrap_err().contains("CNPJ"));
    let letters = SimulateLeadRequest { cnpj: "12.345.678/0001-9A0".into(), ..ok.clone() };
    assert!(letters.validate().is_err());
    let bad_email = SimulateLeadRequest { email: "acme.com".into(), ..ok.clone() };
    assert!(bad_email.validate().unwrap_err().contains("e-mail"));
    let negative = SimulateLeadRequest { valor_contrato: Some(-1.0), ..ok };
    assert!(negative.validate().unwrap_err().contains("valor_contrato"));
}

#[test]
fn error_mapping() {
    let status = |code: u16, body: &str| TransportError::Status { code, message: body.to_string() };
    let e: WeedleError = QueryError::Rejected(status(404, r#"{"detail":"Empresa não encontrada"}"#)).into();
    assert_eq!(e, WeedleError::NotFound("Empresa não encontrada".into()));
    let e: WeedleError = QueryError::Rejected(status(422, "CNPJ inválido")).into();
    assert_eq!(e, WeedleError::Validation("CNPJ inválido".into()));
    let e: WeedleError = QueryError::Rejected(status(401, "")).into();
    assert!(matches!(e, WeedleError::Internal(_)));
    let e: WeedleError = QueryError::Exhausted { attempts: 6, last: TransportError::Timeout }.into();
    assert_eq!(e, WeedleError::Unavailable(weedle_query::TIMEOUT_MESSAGE.into()));
    assert_eq!(e.message(), weedle_query::TIMEOUT_MESSAGE);
}

#[test]
fn params_ignore_absent_filters() {
    assert_eq!(Params::new().with_opt::<&str>("cluster_id", ClusterFilter::All.id()).render(), "");
}
