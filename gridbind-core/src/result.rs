//! Query results: bare sequences, grouped structures and count envelopes.

use serde::Serialize;
use serde_json::{Map, Value};

/// Aggregate results keyed by `"<field> - <type>"`.
pub type Aggregates = Map<String, Value>;

/// The rows of a result: flat records, or groups when grouping was requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultSet<R> {
    Records(Vec<R>),
    Groups(Vec<Group<R>>),
}

impl<R> ResultSet<R> {
    /// Number of top-level entries (records or groups).
    pub fn len(&self) -> usize {
        match self {
            ResultSet::Records(records) => records.len(),
            ResultSet::Groups(groups) => groups.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_records(&self) -> Option<&[R]> {
        match self {
            ResultSet::Records(records) => Some(records),
            ResultSet::Groups(_) => None,
        }
    }

    pub fn as_groups(&self) -> Option<&[Group<R>]> {
        match self {
            ResultSet::Groups(groups) => Some(groups),
            ResultSet::Records(_) => None,
        }
    }

    /// Leaf records in order, flattening any group nesting.
    pub fn leaves(&self) -> Vec<&R> {
        match self {
            ResultSet::Records(records) => records.iter().collect(),
            ResultSet::Groups(groups) => groups.iter().flat_map(|g| g.items.leaves()).collect(),
        }
    }
}

/// One group of records sharing a value of `field`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group<R> {
    pub field: String,
    pub key: Value,
    /// Number of records in the group, across all nesting levels.
    pub count: usize,
    pub items: ResultSet<R>,
    pub aggregates: Aggregates,
}

/// The `{result, count, aggregates}` wrapper returned when counts are requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataResult<R> {
    pub result: ResultSet<R>,
    /// Matching records before pagination.
    pub count: usize,
    pub aggregates: Option<Aggregates>,
}

/// Response to a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult<R> {
    Bare(ResultSet<R>),
    Envelope(DataResult<R>),
}

impl<R> QueryResult<R> {
    pub fn result(&self) -> &ResultSet<R> {
        match self {
            QueryResult::Bare(result) => result,
            QueryResult::Envelope(envelope) => &envelope.result,
        }
    }

    pub fn records(&self) -> Option<&[R]> {
        self.result().as_records()
    }

    pub fn groups(&self) -> Option<&[Group<R>]> {
        self.result().as_groups()
    }

    /// Pre-pagination count; only present on envelopes.
    pub fn count(&self) -> Option<usize> {
        match self {
            QueryResult::Bare(_) => None,
            QueryResult::Envelope(envelope) => Some(envelope.count),
        }
    }

    pub fn aggregates(&self) -> Option<&Aggregates> {
        match self {
            QueryResult::Bare(_) => None,
            QueryResult::Envelope(envelope) => envelope.aggregates.as_ref(),
        }
    }
}
