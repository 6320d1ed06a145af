use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio::signal;
use tracing::{info, warn};
use weedle_api::{
    sample_nps_analytics, ClusterFilter, DashboardMetrics, HttpApi, LeadFilters, MetricsHandle, MetricsSnapshot, MockApi,
    NpsAnalyticsRow, SessionStore, SimulateLeadRequest, WeedleApi,
};
use weedle_core::format::{format_currency, format_number, format_percent};
use weedle_core::{builtin_columns_for, Record, TableKind};
use weedle_table::{DataTable, TableConfig};

#[derive(Parser, Debug)]
#[command(name = "weedlectl", version, about = "Weedle customer analytics CLI")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Serve built-in sample data instead of calling the API
    #[arg(long = "mock", global = true, action = ArgAction::SetTrue)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Args, Debug, Clone)]
struct TableArgs {
    /// Case-insensitive text matched against every column
    #[arg(long = "search", short = 's')]
    search: Option<String>,
    /// Column key to sort by
    #[arg(long = "sort")]
    sort: Option<String>,
    /// Sort descending
    #[arg(long = "desc", action = ArgAction::SetTrue, requires = "sort")]
    desc: bool,
    /// 1-based page
    #[arg(long = "page", default_value_t = 1)]
    page: usize,
    #[arg(long = "per-page", default_value_t = 10)]
    per_page: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Customer segments with their aggregates
    Clusters {
        #[command(flatten)]
        table: TableArgs,
    },
    /// Headline KPIs for every cluster or a single one
    Metrics {
        /// Cluster id, or "all"
        #[arg(long = "cluster", default_value = "all")]
        cluster: String,
    },
    /// Re-fetch the KPIs on an interval and print each change until Ctrl-C
    Watch {
        #[arg(long = "cluster", default_value = "all")]
        cluster: String,
        #[arg(long = "every", default_value_t = 30)]
        every_secs: u64,
    },
    /// Companies, optionally restricted to one cluster
    Companies {
        #[arg(long = "cluster")]
        cluster: Option<String>,
        #[command(flatten)]
        table: TableArgs,
    },
    /// One company by id
    Company { id: String },
    /// Simulated leads
    Leads {
        #[arg(long = "segmento")]
        segmento: Option<String>,
        #[arg(long = "cluster")]
        cluster: Option<String>,
        #[arg(long = "produto")]
        produto: Option<String>,
        #[arg(long = "limit")]
        limit: Option<u64>,
        #[arg(long = "offset")]
        offset: Option<u64>,
        #[command(flatten)]
        table: TableArgs,
    },
    /// Submit a lead for simulation
    SimulateLead {
        #[arg(long = "cnpj")]
        cnpj: String,
        #[arg(long = "nome")]
        nome: String,
        #[arg(long = "email")]
        email: String,
        #[arg(long = "segmento", default_value = "")]
        segmento: String,
        #[arg(long = "produto", default_value = "")]
        produto: String,
        #[arg(long = "capital")]
        capital: Option<f64>,
        #[arg(long = "valor")]
        valor: Option<f64>,
    },
    /// One cluster with its companies
    Cluster { id: String },
    /// Per-client NPS answers
    Nps {
        /// JSON array of rows to load instead of the built-in sample
        #[arg(long = "file")]
        file: Option<PathBuf>,
        #[command(flatten)]
        table: TableArgs,
    },
    /// Company and contract totals
    Stats,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Clusters { .. } => "clusters",
            Commands::Metrics { .. } => "metrics",
            Commands::Watch { .. } => "watch",
            Commands::Companies { .. } => "companies",
            Commands::Company { .. } => "company",
            Commands::Leads { .. } => "leads",
            Commands::SimulateLead { .. } => "simulate-lead",
            Commands::Cluster { .. } => "cluster",
            Commands::Nps { .. } => "nps",
            Commands::Stats => "stats",
        }
    }
}

fn init_tracing() {
    let env = std::env::var("WEEDLE_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("WEEDLE_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            warn!(addr = %addr, "invalid WEEDLE_METRICS_ADDR; expected host:port");
        }
    }
}

#[derive(Serialize)]
struct Page<'a, R> {
    page: usize,
    total_pages: usize,
    total_results: usize,
    rows: Vec<&'a R>,
}

fn show_table<R: Record + Serialize>(rows: Vec<R>, kind: TableKind, title: &str, args: &TableArgs, output: Output) -> Result<()> {
    let config = TableConfig::titled(title).items_per_page(args.per_page);
    let mut table = DataTable::new(rows, builtin_columns_for(kind), config)?;
    if let Some(term) = &args.search {
        table.set_search(term.as_str());
    }
    if let Some(key) = &args.sort {
        if !table.click_header(key) {
            let keys: Vec<&str> = table.columns().iter().filter(|c| c.sortable).map(|c| c.key.as_str()).collect();
            bail!("cannot sort by {key:?}; sortable columns: {}", keys.join(", "));
        }
        if args.desc {
            table.click_header(key);
        }
    }
    if !table.go_to_page(args.page) {
        warn!(page = args.page, total_pages = table.total_pages(), "page out of range; showing page 1");
    }
    match output {
        Output::Human => print!("{}", table.render_text()),
        Output::Json => {
            let page = Page {
                page: table.state().current_page,
                total_pages: table.total_pages(),
                total_results: table.total_results(),
                rows: table.page_rows().collect(),
            };
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
    }
    Ok(())
}

fn load_nps_rows(path: &std::path::Path) -> Result<Vec<NpsAnalyticsRow>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn print_metrics(filter: &ClusterFilter, m: &DashboardMetrics) {
    let r = &m.tempo_medio_resolucao;
    println!("KPIs ({filter})");
    println!("  LTV médio:            {}", format_currency(m.ltv_medio));
    println!("  Ticket médio:         {}", format_currency(m.ticket_medio));
    println!("  Taxa de cross-sell:   {}", format_percent(m.taxa_cross_sell, 2));
    println!(
        "  NPS geral:            {} (relacional {}, suporte {})",
        format_number(m.nps.geral, 1),
        format_number(m.nps.relacional, 1),
        format_number(m.nps.suporte, 1)
    );
    println!(
        "  Tempo de resolução:   {} {} ({} tickets, min {}, max {})",
        format_number(r.valor, 1),
        r.unidade,
        r.total_tickets,
        format_number(r.menor_tempo, 1),
        format_number(r.maior_tempo, 1)
    );
}

async fn watch_metrics(api: &HttpApi, filter: ClusterFilter, every: Duration, output: Output) -> Result<()> {
    let session = SessionStore::new();
    let mut handle = MetricsHandle::subscribe(api.client(), filter.clone());
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;
    let mut last: Option<MetricsSnapshot> = None;
    loop {
        let snap = handle.settled().await?;
        if last.as_ref() != Some(&snap) {
            if let Some(e) = &snap.error {
                warn!(error = %e, "metrics: {}", e.user_message());
            }
            match output {
                Output::Human => {
                    if session.mark_loaded("metrics") {
                        info!(filter = %filter, "first load");
                    }
                    print_metrics(&filter, &snap.metrics);
                }
                Output::Json => println!("{}", serde_json::to_string(&snap)?),
            }
            last = Some(snap);
        }
        tokio::select! {
            _ = ticker.tick() => {
                let started = handle.refetch();
                info!(started, "metrics: refresh");
            }
            _ = signal::ctrl_c() => {
                info!("Ctrl-C received; stopping watch");
                break;
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();
    let t0 = Instant::now();
    let command = cli.command.name();
    metrics::counter!("cli_command_total", 1u64, "command" => command);

    let remote = if cli.mock { None } else { Some(HttpApi::from_env()?) };
    let api: Arc<dyn WeedleApi> = match &remote {
        Some(http) => Arc::new(http.clone()),
        None => Arc::new(MockApi::sample()),
    };

    match cli.command {
        Commands::Clusters { table } => {
            let clusters = api.clusters().await?;
            show_table(clusters, TableKind::Clusters, "Clusters", &table, cli.output)?;
        }
        Commands::Metrics { cluster } => {
            let filter = ClusterFilter::from_str(&cluster)?;
            let m = api.metrics(&filter).await?;
            match cli.output {
                Output::Human => print_metrics(&filter, &m),
                Output::Json => println!("{}", serde_json::to_string_pretty(&m)?),
            }
        }
        Commands::Watch { cluster, every_secs } => {
            let Some(http) = &remote else {
                bail!("watch needs the remote API; drop --mock");
            };
            let filter = ClusterFilter::from_str(&cluster)?;
            watch_metrics(http, filter, Duration::from_secs(every_secs.max(1)), cli.output).await?;
        }
        Commands::Companies { cluster, table } => {
            let companies = match cluster.as_deref() {
                Some(id) => api.companies_by_cluster(id).await?,
                None => api.companies().await?,
            };
            show_table(companies, TableKind::Companies, "Empresas", &table, cli.output)?;
        }
        Commands::Company { id } => {
            let c = api.company(&id).await?;
            match cli.output {
                Output::Human => {
                    println!("{} ({})", c.nome_empresa, c.cnpj);
                    println!("  segmento: {}  produto: {}  cluster: {}", c.segmento, c.produto, c.cluster);
                    println!("  contrato: {}  capital social: {}", format_currency(c.valor_contrato), format_currency(c.capital_social));
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(&c)?),
            }
        }
        Commands::Leads { segmento, cluster, produto, limit, offset, table } => {
            let filters = LeadFilters { segmento, cluster_name: cluster, produto, limit, offset };
            let resp = api.leads(&filters).await?;
            info!(total = resp.total, shown = resp.leads.len(), "leads fetched");
            show_table(resp.leads, TableKind::Leads, "Leads Simulados", &table, cli.output)?;
        }
        Commands::SimulateLead { cnpj, nome, email, segmento, produto, capital, valor } => {
            let req = SimulateLeadRequest {
                cnpj,
                nome_empresa: nome,
                segmento,
                capital_social: capital,
                email,
                produto,
                valor_contrato: valor,
            };
            let resp = api.simulate_lead(req).await?;
            match cli.output {
                Output::Human => println!("{} ({}): cluster {}", resp.message, resp.lead_id, resp.data.cluster_name),
                Output::Json => println!("{}", serde_json::to_string_pretty(&resp)?),
            }
        }
        Commands::Cluster { id } => {
            let c = api.cluster(&id).await?;
            match cli.output {
                Output::Human => {
                    println!("{} ({})", c.nome, c.id);
                    if let Some(d) = &c.descricao {
                        println!("  {d}");
                    }
                    for e in &c.empresas {
                        println!("  - {} ({}) {}", e.nome_empresa, e.cnpj, format_currency(e.valor_contrato));
                    }
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(&c)?),
            }
        }
        Commands::Nps { file, table } => {
            let rows = match file {
                Some(path) => load_nps_rows(&path)?,
                None => sample_nps_analytics(),
            };
            show_table(rows, TableKind::NpsAnalytics, "Analítico NPS", &table, cli.output)?;
        }
        Commands::Stats => {
            let s = api.statistics().await?;
            match cli.output {
                Output::Human => {
                    println!("Empresas: {}", format_number(s.total_empresas as f64, 0));
                    println!("Contratos: {}", format_number(s.total_contratos as f64, 0));
                    println!("Valor médio: {}", format_currency(s.valor_medio_contrato));
                    for (cluster, n) in &s.empresas_por_cluster {
                        println!("  {cluster}: {n}");
                    }
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(&s)?),
            }
        }
    }

    info!(command, took_ms = %t0.elapsed().as_millis(), "done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desc_needs_a_sort_column() {
        let err = Cli::try_parse_from(["weedlectl", "clusters", "--desc"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let cli = Cli::try_parse_from(["weedlectl", "clusters", "--sort", "clients", "--desc"]).unwrap();
        let Commands::Clusters { table } = cli.command else { panic!("expected clusters") };
        assert_eq!(table.sort.as_deref(), Some("clients"));
        assert!(table.desc);
    }

    #[test]
    fn nps_takes_table_flags() {
        let cli = Cli::try_parse_from(["weedlectl", "--mock", "nps", "--search", "promotor", "--per-page", "5"]).unwrap();
        assert!(cli.mock);
        let Commands::Nps { file, table } = cli.command else { panic!("expected nps") };
        assert!(file.is_none());
        assert_eq!((table.search.as_deref(), table.per_page), (Some("promotor"), 5));
    }

    #[test]
    fn sample_nps_rows_render_as_a_table() {
        let args = TableArgs { search: Some("detrator".into()), sort: Some("notaMedia".into()), desc: false, page: 1, per_page: 10 };
        show_table(sample_nps_analytics(), TableKind::NpsAnalytics, "Analítico NPS", &args, Output::Json).unwrap();

        let bad = TableArgs { sort: Some("nope".into()), ..args };
        let err = show_table(sample_nps_analytics(), TableKind::NpsAnalytics, "Analítico NPS", &bad, Output::Json).unwrap_err();
        assert!(err.to_string().contains("cdCliente"));
    }
}
