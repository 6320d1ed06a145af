use std::time::Instant;

use weedle_core::{builtin_columns_for, Row, TableKind};
use weedle_table::{DataTable, TableConfig};

const SEGMENTS: [&str; 5] = ["Varejo", "Serviços", "Indústria", "Tecnologia", "Saúde"];

fn gen_row(i: usize) -> Row {
    Row::new()
        .with("name", format!("Cluster {i:06}"))
        .with("clients", (i * 37) % 5_000)
        .with("avg_ticket", ((i * 7919) % 100_000) as f64 / 10.0)
        .with("frequency", SEGMENTS[i % SEGMENTS.len()])
        .with("contracts", (i * 13) % 900)
        .with("total_contracted", ((i * 104_729) % 10_000_000) as f64)
        .with("nps", (i % 100) as f64 / 10.0)
}

fn percentile_us(xs: &mut [u128], p: f64) -> u128 {
    xs.sort_unstable();
    let idx = ((xs.len() as f64 - 1.0) * p).round() as usize;
    xs[idx]
}

fn main() {
    let n: usize = std::env::var("WEEDLE_BENCH_ROWS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(100_000);

    eprintln!("building table: {} rows", n);
    let t0 = Instant::now();
    let data: Vec<Row> = (0..n).map(gen_row).collect();
    let Ok(mut table) = DataTable::new(data, builtin_columns_for(TableKind::Clusters), TableConfig::default()) else {
        eprintln!("invalid column set");
        return;
    };
    let build_ms = t0.elapsed().as_secs_f64() * 1_000.0;

    let terms: Vec<String> = (0..50).map(|i| format!("{:03}", i * 17)).chain(SEGMENTS.iter().map(|s| s.to_lowercase())).collect();
    let mut times = Vec::with_capacity(terms.len());
    for term in &terms {
        let t = Instant::now();
        table.set_search(term.as_str());
        let _ = table.view();
        times.push(t.elapsed().as_micros());
    }
    let p50 = percentile_us(&mut times.clone(), 0.50) as f64 / 1000.0;
    let p99 = percentile_us(&mut times, 0.99) as f64 / 1000.0;

    table.set_search("");
    let mut sort_times = Vec::new();
    for key in ["total_contracted", "name", "nps", "clients"] {
        let t = Instant::now();
        table.click_header(key);
        sort_times.push(t.elapsed().as_micros());
    }
    let sort_p50 = percentile_us(&mut sort_times, 0.50) as f64 / 1000.0;

    println!("build: {:.1}ms rows={}", build_ms, n);
    println!("search: p50={:.3}ms p99={:.3}ms ({} terms)", p50, p99, terms.len());
    println!("sort: p50={:.3}ms", sort_p50);
}
