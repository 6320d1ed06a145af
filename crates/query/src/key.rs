//! Cache identity and invalidation tags.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Endpoint name plus normalized parameters. Equal keys share one cache
/// entry and one in-flight request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CacheKey {
    pub endpoint: &'static str,
    pub params: String,
}

impl CacheKey {
    pub fn new(endpoint: &'static str, params: Params) -> Self {
        Self { endpoint, params: params.render() }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            f.write_str(self.endpoint)
        } else {
            write!(f, "{}?{}", self.endpoint, self.params)
        }
    }
}

/// Query parameters that take part in the cache key.
///
/// Absent values are dropped and names are sorted on render, so
/// `{b: 2, a: 1, c: None}` and `{a: 1, b: 2}` produce the same key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    pairs: SmallVec<[(String, String); 4]>,
}

impl Params {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set(name, value);
        self
    }

    pub fn with_opt<V: ToString>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(name, v),
            None => self,
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl ToString) {
        let name = name.into();
        let value = value.to_string();
        match self.pairs.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((name, value)),
        }
    }

    pub fn is_empty(&self) -> bool { self.pairs.is_empty() }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn render(&self) -> String {
        let mut sorted: SmallVec<[&(String, String); 4]> = self.pairs.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        sorted.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&")
    }
}

/// Invalidation label. `id: None` on an invalidated tag covers every id of
/// that kind; on a provided tag it only matches kind-wide invalidation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub kind: &'static str,
    pub id: Option<String>,
}

impl Tag {
    pub const fn kind(kind: &'static str) -> Self { Self { kind, id: None } }

    pub fn with_id(kind: &'static str, id: impl Into<String>) -> Self { Self { kind, id: Some(id.into()) } }

    /// Whether an entry providing `self` is hit by invalidating `target`.
    pub fn matches(&self, target: &Tag) -> bool {
        self.kind == target.kind && (target.id.is_none() || target.id == self.id)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}:{}", self.kind, id),
            None => f.write_str(self.kind),
        }
    }
}
