//! DataStore trait — the generic queryable collection abstraction.
//!
//! Recipes issue bounded, filtered, sorted reads keyed by business/user id.
//! Documents are JSON objects grouped into named collections. Backends
//! share the filter/sort/limit semantics in [`StoreQuery::apply`], so the
//! in-memory and SQLite stores answer identically.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

use crate::error::StoreError;

/// Hard cap on rows returned by any single query.
pub const MAX_QUERY_LIMIT: usize = 500;

/// Default row limit when a query does not set one.
pub const DEFAULT_QUERY_LIMIT: usize = 50;

/// A single filter predicate on a (possibly dotted) field path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Filter {
    Eq { field: String, value: Value },
    Ne { field: String, value: Value },
    Gte { field: String, value: Value },
    Lte { field: String, value: Value },
    /// Case-insensitive substring match on strings, membership on arrays
    Contains { field: String, needle: String },
}

impl Filter {
    fn matches(&self, doc: &Value) -> bool {
        match self {
            Self::Eq { field, value } => lookup(doc, field) == Some(value),
            Self::Ne { field, value } => lookup(doc, field) != Some(value),
            Self::Gte { field, value } => lookup(doc, field)
                .and_then(|v| compare_values(v, value))
                .is_some_and(|o| o != Ordering::Less),
            Self::Lte { field, value } => lookup(doc, field)
                .and_then(|v| compare_values(v, value))
                .is_some_and(|o| o != Ordering::Greater),
            Self::Contains { field, needle } => {
                let needle = needle.to_lowercase();
                match lookup(doc, field) {
                    Some(Value::String(s)) => s.to_lowercase().contains(&needle),
                    Some(Value::Array(items)) => items
                        .iter()
                        .any(|i| i.as_str().is_some_and(|s| s.to_lowercase() == needle)),
                    _ => false,
                }
            }
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// A bounded, filtered, sorted read against one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreQuery {
    pub collection: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<(String, SortOrder)>,
    pub limit: usize,
}

impl StoreQuery {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            sort: None,
            limit: DEFAULT_QUERY_LIMIT,
        }
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn ne(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Ne {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn gte(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Gte {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn lte(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Lte {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn contains(mut self, field: impl Into<String>, needle: impl Into<String>) -> Self {
        self.filters.push(Filter::Contains {
            field: field.into(),
            needle: needle.into(),
        });
        self
    }

    pub fn sort_asc(mut self, field: impl Into<String>) -> Self {
        self.sort = Some((field.into(), SortOrder::Ascending));
        self
    }

    pub fn sort_desc(mut self, field: impl Into<String>) -> Self {
        self.sort = Some((field.into(), SortOrder::Descending));
        self
    }

    /// Set the row limit, clamped to [`MAX_QUERY_LIMIT`].
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(MAX_QUERY_LIMIT);
        self
    }

    /// Whether a document satisfies every filter.
    pub fn matches(&self, doc: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }

    /// Filter, sort (stable) and truncate a full collection scan.
    pub fn apply(&self, docs: impl IntoIterator<Item = Value>) -> Vec<Value> {
        let mut rows: Vec<Value> = docs.into_iter().filter(|d| self.matches(d)).collect();

        if let Some((field, order)) = &self.sort {
            rows.sort_by(|a, b| {
                let ord = match (lookup(a, field), lookup(b, field)) {
                    (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                    // Missing values sort last in either direction
                    (Some(_), None) => return Ordering::Less,
                    (None, Some(_)) => return Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                match order {
                    SortOrder::Ascending => ord,
                    SortOrder::Descending => ord.reverse(),
                }
            });
        }

        rows.truncate(self.limit.min(MAX_QUERY_LIMIT));
        rows
    }
}

/// Resolve a dotted path (`customer.name`) inside a JSON document.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, segment| current.get(segment))
}

/// Order two JSON scalars of the same kind. ISO-8601 date strings order
/// correctly as strings.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// The core DataStore trait.
///
/// Implementations: in-memory (tests, ephemeral runs) and SQLite.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// The backend name (e.g., "in_memory", "sqlite").
    fn name(&self) -> &str;

    /// Run a bounded read.
    async fn find(&self, query: &StoreQuery) -> std::result::Result<Vec<Value>, StoreError>;

    /// Insert a JSON object into a collection. Assigns an `id` if missing
    /// and returns it.
    async fn insert(
        &self,
        collection: &str,
        document: Value,
    ) -> std::result::Result<String, StoreError>;

    /// Number of documents in a collection.
    async fn count(&self, collection: &str) -> std::result::Result<usize, StoreError>;
}
