//! Weedle table: in-memory search, sort and pagination over generic records.
//! The pipeline is raw records → filtered → sorted → current page, recomputed
//! synchronously whenever data or view state changes.

#![forbid(unsafe_code)]

use std::ops::Range;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;
use weedle_core::{validate_columns, CellValue, ColumnSpec, CoreError, Record};

pub mod render;
mod state;

pub use render::render_text;
pub use state::{SortDirection, ViewState};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error(transparent)]
    Columns(#[from] CoreError),
    #[error("items per page must be at least 1")]
    ZeroPageSize,
}

/// Display and interaction configuration of one table instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub title: String,
    pub search_placeholder: String,
    pub items_per_page: usize,
    pub height: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            title: "Lista de Dados".to_string(),
            search_placeholder: "Pesquisar...".to_string(),
            items_per_page: 10,
            height: "500px".to_string(),
        }
    }
}

impl TableConfig {
    pub fn titled(title: impl Into<String>) -> Self {
        Self { title: title.into(), ..Self::default() }
    }

    pub fn items_per_page(mut self, n: usize) -> Self { self.items_per_page = n; self }
}

// ---------------- Pipeline stages ----------------

/// `ceil(len / items_per_page)`, never below 1.
pub fn total_pages(len: usize, items_per_page: usize) -> usize {
    len.div_ceil(items_per_page.max(1)).max(1)
}

/// Index range of a 1-based page; empty when the page lies past the data.
pub fn page_range(len: usize, items_per_page: usize, page: usize) -> Range<usize> {
    let ipp = items_per_page.max(1);
    let start = page.max(1).saturating_sub(1).saturating_mul(ipp).min(len);
    let end = start.saturating_add(ipp).min(len);
    start..end
}

fn haystack_for<R: Record>(r: &R) -> SmallVec<[String; 8]> {
    r.values().iter().map(|v| v.display().to_lowercase()).collect()
}

fn matches(haystack: &[String], needle: &str) -> bool {
    needle.is_empty() || haystack.iter().any(|h| h.contains(needle))
}

/// Indices of records where any field contains `term`, case-insensitively.
pub fn filter_indices<R: Record>(data: &[R], term: &str) -> Vec<usize> {
    let needle = term.to_lowercase();
    data.iter()
        .enumerate()
        .filter(|(_, r)| matches(&haystack_for(*r), &needle))
        .map(|(i, _)| i)
        .collect()
}

/// Stable sort of `idx` by the value of `field`.
pub fn sort_indices<R: Record>(data: &[R], idx: &mut Vec<usize>, field: &str, direction: SortDirection) {
    // Compute keys once per element
    let mut keyed: Vec<(usize, CellValue)> = idx.iter().map(|&i| (i, data[i].field(field))).collect();
    keyed.sort_by(|a, b| direction.apply(a.1.compare(&b.1)));
    idx.clear();
    idx.extend(keyed.into_iter().map(|(i, _)| i));
}

// ---------------- Table ----------------

pub struct DataTable<R> {
    data: Vec<R>,
    // Lowercased field strings per record, rebuilt with the data
    haystacks: Vec<SmallVec<[String; 8]>>,
    columns: Vec<ColumnSpec>,
    config: TableConfig,
    state: ViewState,
    // Filtered + sorted indices into `data`
    pipeline: Vec<usize>,
}

impl<R: Record> DataTable<R> {
    pub fn new(data: Vec<R>, columns: Vec<ColumnSpec>, config: TableConfig) -> Result<Self, TableError> {
        validate_columns(&columns)?;
        if config.items_per_page == 0 {
            return Err(TableError::ZeroPageSize);
        }
        let mut table = Self {
            haystacks: Vec::new(),
            data: Vec::new(),
            columns,
            config,
            state: ViewState::default(),
            pipeline: Vec::new(),
        };
        table.set_data(data);
        Ok(table)
    }

    pub fn data(&self) -> &[R] { &self.data }
    pub fn columns(&self) -> &[ColumnSpec] { &self.columns }
    pub fn config(&self) -> &TableConfig { &self.config }
    pub fn state(&self) -> &ViewState { &self.state }

    /// Number of records after filtering.
    pub fn total_results(&self) -> usize { self.pipeline.len() }

    pub fn total_pages(&self) -> usize { total_pages(self.pipeline.len(), self.config.items_per_page) }

    /// Filtered and sorted records across all pages.
    pub fn rows(&self) -> impl Iterator<Item = &R> + '_ {
        self.pipeline.iter().map(move |&i| &self.data[i])
    }

    /// Records on the current page.
    pub fn page_rows(&self) -> impl Iterator<Item = &R> + '_ {
        let range = page_range(self.pipeline.len(), self.config.items_per_page, self.state.current_page);
        self.pipeline[range].iter().map(move |&i| &self.data[i])
    }

    /// Replace the records. The current page is kept but clamped to the new page count.
    pub fn set_data(&mut self, data: Vec<R>) {
        self.haystacks = data.iter().map(haystack_for).collect();
        self.data = data;
        self.recompute();
        self.clamp_page();
    }

    /// Searching always returns to the first page.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.state.search_term = term.into();
        self.state.current_page = 1;
        self.recompute();
    }

    /// Header click. Returns false when the column is unknown or not sortable.
    pub fn click_header(&mut self, key: &str) -> bool {
        let Some(col) = self.columns.iter().find(|c| c.key == key) else {
            return false;
        };
        if !col.sortable {
            return false;
        }
        if self.state.sort_field.as_deref() == Some(key) {
            self.state.sort_direction = self.state.sort_direction.toggled();
        } else {
            self.state.sort_field = Some(key.to_string());
            self.state.sort_direction = SortDirection::Asc;
        }
        self.recompute();
        true
    }

    pub fn set_items_per_page(&mut self, n: usize) -> Result<(), TableError> {
        if n == 0 {
            return Err(TableError::ZeroPageSize);
        }
        self.config.items_per_page = n;
        self.clamp_page();
        Ok(())
    }

    pub fn can_prev(&self) -> bool { self.state.current_page > 1 }
    pub fn can_next(&self) -> bool { self.state.current_page < self.total_pages() }

    pub fn prev_page(&mut self) -> bool {
        if !self.can_prev() { return false; }
        self.state.current_page -= 1;
        true
    }

    pub fn next_page(&mut self) -> bool {
        if !self.can_next() { return false; }
        self.state.current_page += 1;
        true
    }

    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page == 0 || page > self.total_pages() { return false; }
        self.state.current_page = page;
        true
    }

    fn clamp_page(&mut self) {
        let last = self.total_pages();
        if self.state.current_page > last {
            debug!(from = self.state.current_page, to = last, "table: clamping current page");
            self.state.current_page = last;
        }
        if self.state.current_page == 0 {
            self.state.current_page = 1;
        }
    }

    fn recompute(&mut self) {
        let t0 = Instant::now();
        let needle = self.state.search_term.to_lowercase();
        let mut idx: Vec<usize> = self
            .haystacks
            .iter()
            .enumerate()
            .filter(|(_, h)| matches(h, &needle))
            .map(|(i, _)| i)
            .collect();
        if let Some(field) = self.state.sort_field.as_deref() {
            sort_indices(&self.data, &mut idx, field, self.state.sort_direction);
        }
        self.pipeline = idx;
        let elapsed = t0.elapsed();
        metrics::histogram!("table_pipeline_ms", elapsed.as_secs_f64() * 1_000.0);
        debug!(total = self.data.len(), matched = self.pipeline.len(), took_us = %elapsed.as_micros(), "table: pipeline recomputed");
    }

    /// Snapshot of what one render pass shows.
    pub fn view(&self) -> TableView<'_, R> {
        let total = self.pipeline.len();
        let total_pages = self.total_pages();
        let range = page_range(total, self.config.items_per_page, self.state.current_page);
        let header = self
            .columns
            .iter()
            .map(|c| {
                let active = self.state.sort_field.as_deref() == Some(c.key.as_str()) && c.sortable;
                HeaderCell {
                    key: c.key.clone(),
                    label: c.label.clone(),
                    sortable: c.sortable,
                    highlighted: c.highlighted,
                    indicator: active.then(|| self.state.sort_direction.indicator()),
                }
            })
            .collect();
        let rows = self.pipeline[range.clone()].iter().map(|&i| &self.data[i]).collect();
        TableView {
            title: &self.config.title,
            search_placeholder: &self.config.search_placeholder,
            search_term: &self.state.search_term,
            columns: &self.columns,
            header,
            rows,
            current_page: self.state.current_page,
            total_pages,
            total_results: total,
            range,
            can_prev: self.can_prev(),
            can_next: self.can_next(),
            page_buttons: (1..=total_pages).map(|p| PageButton { page: p, active: p == self.state.current_page }).collect(),
        }
    }

    pub fn render_text(&self) -> String { render_text(&self.view()) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderCell {
    pub key: String,
    pub label: String,
    pub sortable: bool,
    pub highlighted: bool,
    /// Present only on the active sort column.
    pub indicator: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageButton {
    pub page: usize,
    pub active: bool,
}

pub struct TableView<'a, R> {
    pub title: &'a str,
    pub search_placeholder: &'a str,
    pub search_term: &'a str,
    pub columns: &'a [ColumnSpec],
    pub header: Vec<HeaderCell>,
    pub rows: Vec<&'a R>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_results: usize,
    /// Position of the page inside the filtered results.
    pub range: Range<usize>,
    pub can_prev: bool,
    pub can_next: bool,
    pub page_buttons: Vec<PageButton>,
}

impl<R: Record> TableView<'_, R> {
    /// Cells of the visible rows, `record[column.key]` as-is.
    pub fn cells(&self) -> Vec<Vec<CellValue>> {
        self.rows
            .iter()
            .map(|r| self.columns.iter().map(|c| r.field(&c.key)).collect())
            .collect()
    }

    pub fn summary(&self) -> String {
        if self.total_results == 0 {
            return "0 resultados".to_string();
        }
        format!(
            "Mostrando {} até {} de {} resultados",
            self.range.start + 1,
            self.range.end,
            self.total_results
        )
    }
}
