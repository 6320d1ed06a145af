//! Weedle core types: cell values, records and column descriptors.

#![forbid(unsafe_code)]

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub mod columns;
pub mod format;

pub use columns::{builtin_columns_for, validate_columns, ColumnSpec, TableKind};

/// Errors raised while validating table contracts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("duplicate column key: {0}")]
    DuplicateColumn(String),
    #[error("column key must not be empty (label: {0})")]
    EmptyKey(String),
}

/// A single displayable value held by a record field.
///
/// `Markup` carries text the caller already rendered (badges, formatted
/// amounts); the engine treats it like text for search and ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Markup(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool { matches!(self, CellValue::Empty) }

    /// String representation used for rendering and search.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) | CellValue::Markup(s) => s.clone(),
        }
    }

    /// Native ordering: numbers numerically, text by code point, empty first.
    /// Mixed number/text pairs fall back to their display strings.
    pub fn compare(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Empty, CellValue::Empty) => Ordering::Equal,
            (CellValue::Empty, _) => Ordering::Less,
            (_, CellValue::Empty) => Ordering::Greater,
            (CellValue::Number(a), CellValue::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (CellValue::Text(a) | CellValue::Markup(a), CellValue::Text(b) | CellValue::Markup(b)) => a.cmp(b),
            (a, b) => a.display().cmp(&b.display()),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self { CellValue::Text(v.to_string()) }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self { CellValue::Text(v) }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self { CellValue::Number(v) }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self { CellValue::Number(v as f64) }
}

impl From<i32> for CellValue {
    fn from(v: i32) -> Self { CellValue::Number(v as f64) }
}

impl From<u32> for CellValue {
    fn from(v: u32) -> Self { CellValue::Number(v as f64) }
}

impl From<u64> for CellValue {
    fn from(v: u64) -> Self { CellValue::Number(v as f64) }
}

impl From<usize> for CellValue {
    fn from(v: usize) -> Self { CellValue::Number(v as f64) }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self { v.map(Into::into).unwrap_or_default() }
}

impl From<&serde_json::Value> for CellValue {
    fn from(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => CellValue::Empty,
            serde_json::Value::Bool(b) => CellValue::Text(b.to_string()),
            serde_json::Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or_default(),
            serde_json::Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }
}

/// A record the table engine can display. Implementations bind column keys
/// to field accessors; unknown keys yield `CellValue::Empty`.
pub trait Record {
    fn field(&self, key: &str) -> CellValue;

    /// Every field of the record, in any order. Search matches against these.
    fn values(&self) -> Vec<CellValue>;
}

/// Mapping-based record with string keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub cells: SmallVec<[(String, CellValue); 8]>,
}

impl Row {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Insert or replace a field.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<CellValue>) {
        let key = key.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.cells.push((key, value)),
        }
    }
}

impl Record for Row {
    fn field(&self, key: &str) -> CellValue {
        self.cells.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()).unwrap_or_default()
    }

    fn values(&self) -> Vec<CellValue> {
        self.cells.iter().map(|(_, v)| v.clone()).collect()
    }
}

/// JSON objects are records keyed by their top-level members.
impl Record for serde_json::Value {
    fn field(&self, key: &str) -> CellValue {
        self.get(key).map(CellValue::from).unwrap_or_default()
    }

    fn values(&self) -> Vec<CellValue> {
        match self.as_object() {
            Some(obj) => obj.values().map(CellValue::from).collect(),
            None => Vec::new(),
        }
    }
}

impl<R: Record + ?Sized> Record for std::sync::Arc<R> {
    fn field(&self, key: &str) -> CellValue { (**self).field(key) }
    fn values(&self) -> Vec<CellValue> { (**self).values() }
}

pub mod prelude {
    pub use super::{CellValue, ColumnSpec, CoreError, Record, Row, TableKind};
}
