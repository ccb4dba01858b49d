//! Declarative query request.
//!
//! Field names follow the grid's data-manager wire format (`where`, `sorted`,
//! `requiresCounts`, ...). Operators, directions and aggregate types are kept
//! as strings here and validated when the engine compiles the request, so an
//! unknown operator is an `InvalidRequest` rather than a deserialization
//! failure.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Grid hosts send `null` for absent lists.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A read request: filter, search, sort, group, aggregate and page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryRequest {
    /// Records to skip; 0 means unset.
    #[serde(deserialize_with = "nullable")]
    pub skip: i64,
    /// Records to take; 0 means unset.
    #[serde(deserialize_with = "nullable")]
    pub take: i64,
    #[serde(deserialize_with = "nullable")]
    pub sorted: Vec<SortDescriptor>,
    #[serde(rename = "where", deserialize_with = "nullable")]
    pub where_filters: Vec<WhereFilter>,
    #[serde(deserialize_with = "nullable")]
    pub search: Vec<SearchFilter>,
    #[serde(deserialize_with = "nullable")]
    pub group: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub aggregates: Vec<AggregateSpec>,
    #[serde(deserialize_with = "nullable")]
    pub requires_counts: bool,
}

impl QueryRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_where(mut self, filter: WhereFilter) -> Self {
        self.where_filters.push(filter);
        self
    }

    pub fn with_sort(mut self, name: &str, direction: &str) -> Self {
        self.sorted.push(SortDescriptor {
            name: name.to_string(),
            direction: direction.to_string(),
        });
        self
    }

    pub fn with_search(mut self, search: SearchFilter) -> Self {
        self.search.push(search);
        self
    }

    pub fn with_group(mut self, field: &str) -> Self {
        self.group.push(field.to_string());
        self
    }

    pub fn with_aggregate(mut self, field: &str, kind: &str) -> Self {
        self.aggregates.push(AggregateSpec {
            field: field.to_string(),
            kind: kind.to_string(),
        });
        self
    }

    pub fn page(mut self, skip: i64, take: i64) -> Self {
        self.skip = skip;
        self.take = take;
        self
    }

    pub fn with_counts(mut self) -> Self {
        self.requires_counts = true;
        self
    }
}

/// One filter predicate, or a complex node combining nested predicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WhereFilter {
    pub field: Option<String>,
    pub operator: Option<String>,
    pub value: Value,
    #[serde(deserialize_with = "nullable")]
    pub ignore_case: bool,
    #[serde(deserialize_with = "nullable")]
    pub is_complex: bool,
    /// `and` / `or`; for the first top-level predicate this also decides how
    /// all top-level predicates combine.
    pub condition: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub predicates: Vec<WhereFilter>,
}

impl WhereFilter {
    pub fn new(field: &str, operator: &str, value: Value) -> Self {
        Self {
            field: Some(field.to_string()),
            operator: Some(operator.to_string()),
            value,
            ..Self::default()
        }
    }

    /// A complex node joining `predicates` with `condition`.
    pub fn complex(condition: &str, predicates: Vec<WhereFilter>) -> Self {
        Self {
            is_complex: true,
            condition: Some(condition.to_string()),
            predicates,
            ..Self::default()
        }
    }

    pub fn case_insensitive(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    pub fn with_condition(mut self, condition: &str) -> Self {
        self.condition = Some(condition.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortDescriptor {
    pub name: String,
    #[serde(default = "default_direction")]
    pub direction: String,
}

fn default_direction() -> String {
    "ascending".to_string()
}

/// A free-text search term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    /// Fields to search; empty means the engine's configured search fields.
    #[serde(default, deserialize_with = "nullable")]
    pub fields: Vec<String>,
    pub key: String,
    #[serde(default = "default_search_operator")]
    pub operator: String,
    /// Overrides the engine's configured case sensitivity when set.
    #[serde(default)]
    pub ignore_case: Option<bool>,
}

fn default_search_operator() -> String {
    "contains".to_string()
}

impl SearchFilter {
    pub fn new(key: &str) -> Self {
        Self {
            fields: Vec::new(),
            key: key.to_string(),
            operator: default_search_operator(),
            ignore_case: None,
        }
    }

    pub fn in_fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_operator(mut self, operator: &str) -> Self {
        self.operator = operator.to_string();
        self
    }

    pub fn case_sensitive(mut self) -> Self {
        self.ignore_case = Some(false);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSpec {
    pub field: String,
    #[serde(rename = "type")]
    pub kind: String,
}
