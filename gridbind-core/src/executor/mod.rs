//! Query engine.
//!
//! [`QueryEngine`] owns an in-memory collection and runs declarative
//! [`QueryRequest`]s against it. A query runs as a fixed pipeline:
//!
//! 1. filter
//! 2. search
//! 3. count (before pagination)
//! 4. stable multi-key sort
//! 5. group
//! 6. aggregate (over every matching record)
//! 7. skip / take
//! 8. assemble the bare result or the count envelope

mod aggregate;
mod group;
mod helpers;
mod plan;

pub use aggregate::AggregateFunction;
pub use helpers::*;
pub use plan::{Condition, FilterOperator};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::record::{FieldTable, Record};
use crate::request::QueryRequest;
use crate::result::{Aggregates, DataResult, QueryResult, ResultSet};

use self::aggregate::compute_all;
use self::group::group_records;
use self::plan::QueryPlan;

/// What skip/take apply to when a request also groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupPaging {
    /// Page over top-level groups built from every matching record.
    #[default]
    Groups,
    /// Page the flat record sequence, then group only that page.
    Records,
}

/// Envelope `aggregates` when the request asks for none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateDefault {
    #[default]
    Empty,
    Null,
}

/// Engine behavior knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Fields searched when a search term names none; empty means all fields.
    pub search_fields: Vec<String>,
    /// Case sensitivity for search terms that don't set `ignoreCase`.
    pub search_ignore_case: bool,
    pub group_paging: GroupPaging,
    pub aggregate_default: AggregateDefault,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            search_fields: Vec::new(),
            search_ignore_case: true,
            group_paging: GroupPaging::default(),
            aggregate_default: AggregateDefault::default(),
        }
    }
}

/// In-memory collection plus the read/insert/remove/update operations.
pub struct QueryEngine<R: Record> {
    records: Vec<R>,
    fields: FieldTable<R>,
    options: EngineOptions,
}

impl<R: Record> QueryEngine<R> {
    /// Create an engine over `records` with default options.
    pub fn new(records: Vec<R>) -> EngineResult<Self> {
        Self::with_options(records, EngineOptions::default())
    }

    /// Create an engine with custom options.
    ///
    /// Fails when the record type's field table is malformed or a configured
    /// search field does not exist.
    pub fn with_options(records: Vec<R>, options: EngineOptions) -> EngineResult<Self> {
        let fields = FieldTable::resolve()?;
        for name in &options.search_fields {
            fields
                .get(name)
                .map_err(|_| EngineError::Schema(format!("unknown search field '{}'", name)))?;
        }
        Ok(Self {
            records,
            fields,
            options,
        })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn fields(&self) -> &FieldTable<R> {
        &self.fields
    }

    /// The collection in its current order.
    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Key value of `record`, read through the key accessor.
    pub fn key_of(&self, record: &R) -> Value {
        self.fields.key().value(record)
    }

    /// First record whose key equals `key`.
    pub fn find(&self, key: &Value) -> Option<&R> {
        self.position(key).map(|i| &self.records[i])
    }

    fn position(&self, key: &Value) -> Option<usize> {
        let accessor = self.fields.key();
        self.records
            .iter()
            .position(|r| values_equal(&accessor.value(r), key))
    }

    /// Run a read request.
    pub fn query(&self, request: &QueryRequest) -> EngineResult<QueryResult<R>> {
        let plan = QueryPlan::compile(request, &self.fields, &self.options)?;

        let mut rows: Vec<&R> = self.records.iter().filter(|r| plan.matches(r)).collect();
        if plan.filter.is_some() {
            debug!(matched = rows.len(), total = self.records.len(), "filter");
        }

        if !plan.search.is_empty() {
            rows.retain(|r| plan.search_matches(r));
            debug!(matched = rows.len(), terms = plan.search.len(), "search");
        }

        let count = rows.len();

        if !plan.sort.is_empty() {
            rows.sort_by(|a, b| plan.compare(a, b));
            debug!(keys = plan.sort.len(), "sort");
        }

        let aggregates = if plan.aggregates.is_empty() {
            match self.options.aggregate_default {
                AggregateDefault::Empty => Some(Aggregates::new()),
                AggregateDefault::Null => None,
            }
        } else {
            Some(compute_all(&plan.aggregates, &rows))
        };

        let result = if plan.group_by.is_empty() {
            ResultSet::Records(plan.page(rows).into_iter().cloned().collect())
        } else {
            match self.options.group_paging {
                GroupPaging::Groups => {
                    let groups = group_records(&rows, &plan.group_by, &plan.aggregates);
                    debug!(groups = groups.len(), "group");
                    ResultSet::Groups(plan.page(groups))
                }
                GroupPaging::Records => {
                    let page = plan.page(rows);
                    let groups = group_records(&page, &plan.group_by, &plan.aggregates);
                    debug!(groups = groups.len(), page = page.len(), "group");
                    ResultSet::Groups(groups)
                }
            }
        };

        debug!(
            count,
            returned = result.len(),
            skip = plan.skip,
            take = plan.take,
            "query"
        );

        if plan.requires_counts {
            Ok(QueryResult::Envelope(DataResult {
                result,
                count,
                aggregates,
            }))
        } else {
            Ok(QueryResult::Bare(result))
        }
    }

    /// Insert at the head of the collection.
    ///
    /// Keys are not checked for uniqueness; callers supply fresh identifiers.
    pub fn insert(&mut self, record: R) -> R {
        self.records.insert(0, record.clone());
        debug!(key = %self.key_of(&record), len = self.records.len(), "insert");
        record
    }

    /// Remove the first record whose key equals `key`. Absent keys are a no-op.
    pub fn remove(&mut self, key: impl Into<Value>) -> Option<R> {
        let key = key.into();
        match self.position(&key) {
            Some(i) => {
                let removed = self.records.remove(i);
                debug!(%key, len = self.records.len(), "remove");
                Some(removed)
            }
            None => {
                warn!(%key, "remove: no record with this key");
                None
            }
        }
    }

    /// Like [`QueryEngine::remove`], but an absent key is `NotFound`.
    pub fn try_remove(&mut self, key: impl Into<Value>) -> EngineResult<R> {
        let key = key.into();
        self.remove(key.clone())
            .ok_or_else(|| EngineError::NotFound(format!("{} {}", R::KEY_FIELD, key)))
    }

    /// Overwrite the stored record that shares `record`'s key.
    ///
    /// Returns the updated record, or `None` when no record has that key.
    pub fn update(&mut self, record: R) -> Option<R> {
        let key = self.key_of(&record);
        match self.position(&key) {
            Some(i) => {
                let existing = &mut self.records[i];
                existing.apply_update(&record);
                debug!(%key, "update");
                Some(existing.clone())
            }
            None => {
                warn!(%key, "update: no record with this key");
                None
            }
        }
    }

    /// Like [`QueryEngine::update`], but an absent key is `NotFound`.
    pub fn try_update(&mut self, record: R) -> EngineResult<R> {
        let key = self.key_of(&record);
        self.update(record)
            .ok_or_else(|| EngineError::NotFound(format!("{} {}", R::KEY_FIELD, key)))
    }
}
