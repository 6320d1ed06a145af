#![forbid(unsafe_code)]

use weedle_core::{CellValue, ColumnSpec, Record, Row};
use weedle_table::{filter_indices, page_range, sort_indices, total_pages, DataTable, SortDirection, TableConfig};

fn cols() -> Vec<ColumnSpec> {
    vec![ColumnSpec::new("name", "Nome"), ColumnSpec::new("val", "Valor")]
}

fn row(name: &str, val: i64) -> Row {
    Row::new().with("name", name).with("val", val)
}

fn names<'a>(it: impl Iterator<Item = &'a Row>) -> Vec<String> {
    it.map(|r| r.field("name").display()).collect()
}

#[test]
fn sort_by_name_ascending() {
    let mut t = DataTable::new(vec![row("B", 2), row("A", 1)], cols(), TableConfig::default()).unwrap();
    assert!(t.click_header("name"));
    let rows: Vec<(String, CellValue)> = t.page_rows().map(|r| (r.field("name").display(), r.field("val"))).collect();
    assert_eq!(rows, vec![("A".to_string(), CellValue::Number(1.0)), ("B".to_string(), CellValue::Number(2.0))]);
}

#[test]
fn twenty_five_records_make_three_pages() {
    let data: Vec<Row> = (0..25).map(|i| row(&format!("r{i:02}"), i)).collect();
    let mut t = DataTable::new(data, cols(), TableConfig::default()).unwrap();
    assert_eq!(t.total_pages(), 3);
    assert!(t.go_to_page(3));
    assert_eq!(t.page_rows().count(), 5);
    assert_eq!(t.view().summary(), "Mostrando 21 até 25 de 25 resultados");
}

#[test]
fn search_without_matches_yields_single_empty_page() {
    let mut t = DataTable::new(vec![row("alpha", 1), row("beta", 2)], cols(), TableConfig::default()).unwrap();
    t.set_search("xyz");
    let v = t.view();
    assert_eq!(v.total_pages, 1);
    assert!(v.rows.is_empty());
    assert_eq!(v.summary(), "0 resultados");
    assert!(!v.can_prev && !v.can_next);
}

#[test]
fn filter_is_case_insensitive_over_every_field() {
    let data = vec![
        Row::new().with("name", "Clientes Premium").with("segment", "VAREJO"),
        Row::new().with("name", "Inativos").with("segment", "Serviços"),
        Row::new().with("name", "Críticos").with("segment", "varejo"),
        Row::new().with("name", "Outro").with("hidden", 42),
    ];
    assert_eq!(filter_indices(&data, "varejo"), vec![0, 2]);
    assert_eq!(filter_indices(&data, "PREM"), vec![0]);
    assert_eq!(filter_indices(&data, "42"), vec![3]);
    assert_eq!(filter_indices(&data, ""), vec![0, 1, 2, 3]);
}

#[test]
fn filter_does_not_match_across_field_boundaries() {
    let data = vec![Row::new().with("a", "ab").with("b", "cd")];
    assert!(filter_indices(&data, "bc").is_empty());
}

#[test]
fn sort_is_stable_in_both_directions() {
    // equal keys keep their pre-sort order whichever way we sort
    let data = vec![row("x1", 2), row("y1", 1), row("x2", 2), row("y2", 1), row("x3", 2)];
    let mut asc: Vec<usize> = (0..data.len()).collect();
    sort_indices(&data, &mut asc, "val", SortDirection::Asc);
    assert_eq!(asc, vec![1, 3, 0, 2, 4]);

    let mut desc: Vec<usize> = (0..data.len()).collect();
    sort_indices(&data, &mut desc, "val", SortDirection::Desc);
    assert_eq!(desc, vec![0, 2, 4, 1, 3]);

    let mut again = asc.clone();
    sort_indices(&data, &mut again, "val", SortDirection::Asc);
    assert_eq!(again, asc);
}

#[test]
fn sort_on_missing_field_keeps_insertion_order() {
    let data = vec![row("c", 3), row("a", 1), row("b", 2)];
    let mut idx: Vec<usize> = (0..3).collect();
    sort_indices(&data, &mut idx, "nope", SortDirection::Desc);
    assert_eq!(idx, vec![0, 1, 2]);
}

#[test]
fn pages_concatenate_to_full_result() {
    let data: Vec<Row> = (0..37).map(|i| row(&format!("n{}", (i * 7) % 37), (i * 13) % 5)).collect();
    for ipp in 1..=40 {
        let mut t = DataTable::new(data.clone(), cols(), TableConfig::default().items_per_page(ipp)).unwrap();
        t.click_header("val");
        let full = names(t.rows());
        let mut joined = Vec::new();
        for p in 1..=t.total_pages() {
            assert!(t.go_to_page(p));
            joined.extend(names(t.page_rows()));
        }
        assert_eq!(joined, full, "items_per_page={ipp}");
        assert_eq!(joined.len(), 37);
    }
}

#[test]
fn page_math() {
    assert_eq!(total_pages(0, 10), 1);
    assert_eq!(total_pages(10, 10), 1);
    assert_eq!(total_pages(11, 10), 2);
    assert_eq!(page_range(25, 10, 3), 20..25);
    assert_eq!(page_range(25, 10, 4), 25..25);
    assert_eq!(page_range(0, 10, 1), 0..0);
}

#[test]
fn json_records_feed_the_table() {
    let data = vec![
        serde_json::json!({ "nome": "Beta", "valor": 2 }),
        serde_json::json!({ "nome": "Alfa", "valor": 10 }),
    ];
    let mut t = DataTable::new(
        data,
        vec![ColumnSpec::new("nome", "Nome"), ColumnSpec::new("valor", "Valor")],
        TableConfig::default(),
    )
    .unwrap();
    t.click_header("valor");
    t.click_header("valor");
    let first = t.page_rows().next().unwrap();
    assert_eq!(first.field("nome").display(), "Alfa");
}
