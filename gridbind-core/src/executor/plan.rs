//! Request compilation.
//!
//! A [`QueryRequest`] carries field names and operator strings. Compiling it
//! against a [`FieldTable`] resolves every name to an accessor, parses every
//! operator, and coerces filter values to the field's kind, so evaluation never
//! looks anything up by name.

use std::cmp::Ordering;

use regex::Regex;
use serde_json::Value;

use crate::error::{EngineError, EngineResult};
use crate::record::{date_value, parse_date, Field, FieldKind, FieldTable};
use crate::request::{QueryRequest, SearchFilter, SortDescriptor, WhereFilter};

use super::aggregate::{AggregateFunction, AggregatePlan};
use super::helpers::*;
use super::EngineOptions;

/// How sibling predicates combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    And,
    Or,
}

impl Condition {
    /// Missing means `and`.
    pub fn parse(name: Option<&str>) -> EngineResult<Self> {
        match name.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("and") => Ok(Condition::And),
            Some("or") => Ok(Condition::Or),
            Some(other) => Err(EngineError::invalid(format!(
                "unknown condition '{}'",
                other
            ))),
        }
    }
}

/// Filter operators understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Contains,
    StartsWith,
    EndsWith,
    Like,
    IsNull,
    IsNotNull,
    IsEmpty,
    IsNotEmpty,
}

impl FilterOperator {
    pub fn parse(name: &str) -> EngineResult<Self> {
        let op = match name.trim().to_ascii_lowercase().as_str() {
            "equal" | "equals" | "eq" => FilterOperator::Equal,
            "notequal" | "notequals" | "ne" => FilterOperator::NotEqual,
            "greaterthan" | "gt" => FilterOperator::GreaterThan,
            "greaterthanorequal" | "ge" => FilterOperator::GreaterThanOrEqual,
            "lessthan" | "lt" => FilterOperator::LessThan,
            "lessthanorequal" | "le" => FilterOperator::LessThanOrEqual,
            "contains" => FilterOperator::Contains,
            "startswith" => FilterOperator::StartsWith,
            "endswith" => FilterOperator::EndsWith,
            "like" => FilterOperator::Like,
            "isnull" => FilterOperator::IsNull,
            "isnotnull" => FilterOperator::IsNotNull,
            "isempty" => FilterOperator::IsEmpty,
            "isnotempty" => FilterOperator::IsNotEmpty,
            _ => {
                return Err(EngineError::invalid(format!(
                    "unknown filter operator '{}'",
                    name
                )))
            }
        };
        Ok(op)
    }

    fn takes_value(self) -> bool {
        !matches!(
            self,
            FilterOperator::IsNull
                | FilterOperator::IsNotNull
                | FilterOperator::IsEmpty
                | FilterOperator::IsNotEmpty
        )
    }

    fn is_textual(self) -> bool {
        matches!(
            self,
            FilterOperator::Contains
                | FilterOperator::StartsWith
                | FilterOperator::EndsWith
                | FilterOperator::Like
        )
    }
}

/// A compiled filter tree.
pub(crate) enum Predicate<R> {
    Leaf(Leaf<R>),
    Compound {
        condition: Condition,
        children: Vec<Predicate<R>>,
    },
}

pub(crate) struct Leaf<R> {
    field: Field<R>,
    op: FilterOperator,
    value: Value,
    ignore_case: bool,
    /// Case-folded string form of `value` for text operators.
    needle: Option<String>,
    pattern: Option<Regex>,
}

impl<R> Predicate<R> {
    pub fn matches(&self, record: &R) -> bool {
        match self {
            Predicate::Leaf(leaf) => leaf.matches(record),
            Predicate::Compound {
                condition,
                children,
            } => {
                if children.is_empty() {
                    return true;
                }
                match condition {
                    Condition::And => children.iter().all(|c| c.matches(record)),
                    Condition::Or => children.iter().any(|c| c.matches(record)),
                }
            }
        }
    }
}

impl<R> Leaf<R> {
    fn matches(&self, record: &R) -> bool {
        let actual = self.field.value(record);

        match self.op {
            FilterOperator::IsNull => actual.is_null(),
            FilterOperator::IsNotNull => !actual.is_null(),
            FilterOperator::IsEmpty => is_empty(&actual),
            FilterOperator::IsNotEmpty => !is_empty(&actual),
            FilterOperator::Equal => self.equals(&actual),
            FilterOperator::NotEqual => !self.equals(&actual),
            FilterOperator::GreaterThan => self.ordering(&actual) == Some(Ordering::Greater),
            FilterOperator::GreaterThanOrEqual => {
                matches!(self.ordering(&actual), Some(Ordering::Greater | Ordering::Equal))
            }
            FilterOperator::LessThan => self.ordering(&actual) == Some(Ordering::Less),
            FilterOperator::LessThanOrEqual => {
                matches!(self.ordering(&actual), Some(Ordering::Less | Ordering::Equal))
            }
            FilterOperator::Like => match (&self.pattern, display_string(&actual)) {
                (Some(pattern), Some(hay)) => pattern.is_match(&hay),
                _ => false,
            },
            FilterOperator::Contains | FilterOperator::StartsWith | FilterOperator::EndsWith => {
                let (Some(needle), Some(hay)) = (&self.needle, display_string(&actual)) else {
                    return false;
                };
                let hay = fold_case(&hay, self.ignore_case);
                match self.op {
                    FilterOperator::Contains => hay.contains(needle.as_str()),
                    FilterOperator::StartsWith => hay.starts_with(needle.as_str()),
                    _ => hay.ends_with(needle.as_str()),
                }
            }
        }
    }

    fn equals(&self, actual: &Value) -> bool {
        match (actual, &self.value) {
            (Value::String(a), Value::String(b)) if self.ignore_case => {
                a.to_lowercase() == b.to_lowercase()
            }
            _ => values_equal(actual, &self.value),
        }
    }

    /// Range comparison; `None` when either side is null.
    fn ordering(&self, actual: &Value) -> Option<Ordering> {
        if actual.is_null() || self.value.is_null() {
            return None;
        }
        match (actual, &self.value) {
            (Value::String(a), Value::String(b)) if self.ignore_case => {
                Some(a.to_lowercase().cmp(&b.to_lowercase()))
            }
            _ => Some(compare_values(actual, &self.value)),
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Coerce a filter value to the domain of `field`.
fn coerce_value<R>(field: &Field<R>, op: FilterOperator, value: &Value) -> EngineResult<Value> {
    if !op.takes_value() {
        return Ok(Value::Null);
    }
    if op.is_textual() {
        return display_string(value).map(Value::String).ok_or_else(|| {
            EngineError::invalid(format!("operator on '{}' requires a value", field.name))
        });
    }
    if value.is_null() {
        return Ok(Value::Null);
    }

    let mismatch = || {
        EngineError::invalid(format!(
            "value {} does not fit {:?} field '{}'",
            value, field.kind, field.name
        ))
    };

    match (field.kind, value) {
        (FieldKind::Number, Value::Number(_)) => Ok(value.clone()),
        (FieldKind::Number, Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(serde_json::Number::from)
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(serde_json::Number::from_f64))
                .map(Value::Number)
                .ok_or_else(mismatch)
        }
        (FieldKind::Date, Value::String(s)) => {
            parse_date(s).map(|d| date_value(&d)).ok_or_else(mismatch)
        }
        (FieldKind::Boolean, Value::Bool(_)) => Ok(value.clone()),
        (FieldKind::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(mismatch()),
        },
        (FieldKind::Text, Value::String(_)) => Ok(value.clone()),
        (FieldKind::Text, Value::Number(_) | Value::Bool(_)) => {
            Ok(display_string(value).map(Value::String).unwrap_or(Value::Null))
        }
        _ => Err(mismatch()),
    }
}

fn compile_filter<R>(filter: &WhereFilter, fields: &FieldTable<R>) -> EngineResult<Predicate<R>> {
    if filter.is_complex || (filter.field.is_none() && !filter.predicates.is_empty()) {
        let condition = Condition::parse(filter.condition.as_deref())?;
        let children = filter
            .predicates
            .iter()
            .map(|p| compile_filter(p, fields))
            .collect::<EngineResult<Vec<_>>>()?;
        return Ok(Predicate::Compound {
            condition,
            children,
        });
    }

    let name = filter
        .field
        .as_deref()
        .ok_or_else(|| EngineError::invalid("filter predicate without a field"))?;
    let field = *fields.get(name)?;
    let op_name = filter
        .operator
        .as_deref()
        .ok_or_else(|| EngineError::invalid(format!("filter on '{}' has no operator", name)))?;
    let op = FilterOperator::parse(op_name)?;
    let value = coerce_value(&field, op, &filter.value)?;

    let needle = match (op.is_textual(), value.as_str()) {
        (true, Some(s)) => Some(fold_case(s, filter.ignore_case)),
        _ => None,
    };
    let pattern = match (op, value.as_str()) {
        (FilterOperator::Like, Some(s)) => Some(like_regex(s, filter.ignore_case).map_err(|e| {
            EngineError::invalid(format!("bad like pattern '{}': {}", s, e))
        })?),
        _ => None,
    };

    Ok(Predicate::Leaf(Leaf {
        field,
        op,
        value,
        ignore_case: filter.ignore_case,
        needle,
        pattern,
    }))
}

/// A compiled free-text search term.
pub(crate) struct SearchTerm<R> {
    fields: Vec<Field<R>>,
    op: FilterOperator,
    key: String,
    ignore_case: bool,
}

impl<R> SearchTerm<R> {
    pub fn matches(&self, record: &R) -> bool {
        if self.key.is_empty() {
            return true;
        }
        self.fields.iter().any(|field| {
            let Some(hay) = display_string(&field.value(record)) else {
                return false;
            };
            let hay = fold_case(&hay, self.ignore_case);
            match self.op {
                FilterOperator::StartsWith => hay.starts_with(self.key.as_str()),
                FilterOperator::EndsWith => hay.ends_with(self.key.as_str()),
                FilterOperator::Equal => hay == self.key,
                _ => hay.contains(self.key.as_str()),
            }
        })
    }
}

fn compile_search<R>(
    search: &SearchFilter,
    fields: &FieldTable<R>,
    options: &EngineOptions,
) -> EngineResult<SearchTerm<R>> {
    let op = FilterOperator::parse(&search.operator)?;
    if !matches!(
        op,
        FilterOperator::Contains
            | FilterOperator::StartsWith
            | FilterOperator::EndsWith
            | FilterOperator::Equal
    ) {
        return Err(EngineError::invalid(format!(
            "operator '{}' is not supported for search",
            search.operator
        )));
    }

    let names: Vec<&str> = if !search.fields.is_empty() {
        search.fields.iter().map(String::as_str).collect()
    } else if !options.search_fields.is_empty() {
        options.search_fields.iter().map(String::as_str).collect()
    } else {
        fields.iter().map(|f| f.name).collect()
    };
    let resolved = names
        .into_iter()
        .map(|name| fields.get(name).copied())
        .collect::<EngineResult<Vec<_>>>()?;

    let ignore_case = search.ignore_case.unwrap_or(options.search_ignore_case);
    Ok(SearchTerm {
        fields: resolved,
        op,
        key: fold_case(&search.key, ignore_case),
        ignore_case,
    })
}

/// One key of an ordered multi-key sort.
pub(crate) struct SortKey<R> {
    field: Field<R>,
    descending: bool,
}

fn compile_sort<R>(sort: &SortDescriptor, fields: &FieldTable<R>) -> EngineResult<SortKey<R>> {
    let field = *fields.get(&sort.name)?;
    let descending = match sort.direction.trim().to_ascii_lowercase().as_str() {
        "" | "ascending" | "asc" => false,
        "descending" | "desc" => true,
        other => {
            return Err(EngineError::invalid(format!(
                "unknown sort direction '{}'",
                other
            )))
        }
    };
    Ok(SortKey { field, descending })
}

/// Validated, name-resolved form of a [`QueryRequest`].
pub(crate) struct QueryPlan<R> {
    pub filter: Option<Predicate<R>>,
    pub search: Vec<SearchTerm<R>>,
    pub sort: Vec<SortKey<R>>,
    pub group_by: Vec<Field<R>>,
    pub aggregates: Vec<AggregatePlan<R>>,
    pub skip: usize,
    pub take: usize,
    pub requires_counts: bool,
}

impl<R> QueryPlan<R> {
    pub fn compile(
        request: &QueryRequest,
        fields: &FieldTable<R>,
        options: &EngineOptions,
    ) -> EngineResult<Self> {
        if request.skip < 0 {
            return Err(EngineError::invalid(format!(
                "skip must not be negative (got {})",
                request.skip
            )));
        }
        if request.take < 0 {
            return Err(EngineError::invalid(format!(
                "take must not be negative (got {})",
                request.take
            )));
        }

        // Top-level predicates combine with the first predicate's condition.
        let filter = match request.where_filters.first() {
            None => None,
            Some(first) => {
                let condition = Condition::parse(first.condition.as_deref())?;
                let children = request
                    .where_filters
                    .iter()
                    .map(|f| compile_filter(f, fields))
                    .collect::<EngineResult<Vec<_>>>()?;
                Some(Predicate::Compound {
                    condition,
                    children,
                })
            }
        };

        let search = request
            .search
            .iter()
            .map(|s| compile_search(s, fields, options))
            .collect::<EngineResult<Vec<_>>>()?;

        let sort = request
            .sorted
            .iter()
            .map(|s| compile_sort(s, fields))
            .collect::<EngineResult<Vec<_>>>()?;

        let group_by = request
            .group
            .iter()
            .map(|name| fields.get(name).copied())
            .collect::<EngineResult<Vec<_>>>()?;

        let aggregates = request
            .aggregates
            .iter()
            .map(|spec| {
                let field = *fields.get(&spec.field)?;
                let function = AggregateFunction::parse(&spec.kind)?;
                Ok(AggregatePlan::new(field, function))
            })
            .collect::<EngineResult<Vec<_>>>()?;

        Ok(Self {
            filter,
            search,
            sort,
            group_by,
            aggregates,
            skip: request.skip as usize,
            take: request.take as usize,
            requires_counts: request.requires_counts,
        })
    }

    pub fn matches(&self, record: &R) -> bool {
        self.filter.as_ref().map_or(true, |f| f.matches(record))
    }

    pub fn search_matches(&self, record: &R) -> bool {
        self.search.iter().all(|term| term.matches(record))
    }

    pub fn compare(&self, a: &R, b: &R) -> Ordering {
        for key in &self.sort {
            let ordering = compare_values(&key.field.value(a), &key.field.value(b));
            if ordering != Ordering::Equal {
                return if key.descending {
                    ordering.reverse()
                } else {
                    ordering
                };
            }
        }
        Ordering::Equal
    }

    /// Apply skip then take; zero means unset for both.
    pub fn page<T>(&self, items: Vec<T>) -> Vec<T> {
        let rest = items.into_iter().skip(self.skip);
        if self.take == 0 {
            rest.collect()
        } else {
            rest.take(self.take).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{inventory, Item};
    use serde_json::json;

    fn plan(request: &QueryRequest) -> EngineResult<QueryPlan<Item>> {
        let fields = FieldTable::<Item>::resolve().unwrap();
        QueryPlan::compile(request, &fields, &EngineOptions::default())
    }

    fn matching(request: &QueryRequest) -> Vec<i64> {
        let plan = plan(request).unwrap();
        inventory()
            .into_iter()
            .filter(|r| plan.matches(r) && plan.search_matches(r))
            .map(|r| r.id)
            .collect()
    }

    #[test]
    fn test_parse_operators() {
        assert_eq!(FilterOperator::parse("equal").unwrap(), FilterOperator::Equal);
        assert_eq!(
            FilterOperator::parse("GreaterThanOrEqual").unwrap(),
            FilterOperator::GreaterThanOrEqual
        );
        assert_eq!(FilterOperator::parse("like").unwrap(), FilterOperator::Like);
        assert!(matches!(
            FilterOperator::parse("between"),
            Err(EngineError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let request =
            QueryRequest::new().with_where(WhereFilter::new("price", "between", json!(1)));
        assert_eq!(
            plan(&request).err(),
            Some(EngineError::InvalidRequest(
                "unknown filter operator 'between'".to_string()
            ))
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let request = QueryRequest::new().with_sort("weight", "ascending");
        assert!(matches!(plan(&request), Err(EngineError::InvalidRequest(_))));
    }

    #[test]
    fn test_negative_paging_rejected() {
        assert!(matches!(
            plan(&QueryRequest::new().page(-1, 0)),
            Err(EngineError::InvalidRequest(_))
        ));
        assert!(matches!(
            plan(&QueryRequest::new().page(0, -5)),
            Err(EngineError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_numeric_comparisons() {
        let gt = QueryRequest::new().with_where(WhereFilter::new("price", "greaterthan", json!(25)));
        assert_eq!(matching(&gt), vec![2, 4]);

        let ge = QueryRequest::new()
            .with_where(WhereFilter::new("price", "greaterthanorequal", json!(25)));
        assert_eq!(matching(&ge), vec![1, 2, 4, 7]);

        let lt = QueryRequest::new().with_where(WhereFilter::new("price", "lessthan", json!("1")));
        assert_eq!(matching(&lt), vec![5, 8]);

        let ne = QueryRequest::new().with_where(WhereFilter::new("price", "notequal", json!(40)));
        assert_eq!(matching(&ne), vec![1, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn test_uncoercible_value_rejected() {
        let request =
            QueryRequest::new().with_where(WhereFilter::new("price", "equal", json!("cheap")));
        assert!(matches!(plan(&request), Err(EngineError::InvalidRequest(_))));

        let request =
            QueryRequest::new().with_where(WhereFilter::new("added", "lessthan", json!("soon")));
        assert!(matches!(plan(&request), Err(EngineError::InvalidRequest(_))));
    }

    #[test]
    fn test_string_operators() {
        let starts = QueryRequest::new()
            .with_where(WhereFilter::new("name", "startswith", json!("g")).case_insensitive());
        assert_eq!(matching(&starts), vec![2, 4]);

        let starts_exact =
            QueryRequest::new().with_where(WhereFilter::new("name", "startswith", json!("g")));
        assert!(matching(&starts_exact).is_empty());

        let contains =
            QueryRequest::new().with_where(WhereFilter::new("name", "contains", json!("ro")));
        assert_eq!(matching(&contains), vec![3]);

        let ends = QueryRequest::new().with_where(WhereFilter::new("name", "endswith", json!("t")));
        assert_eq!(matching(&ends), vec![1, 2, 3, 5, 8]);

        let like = QueryRequest::new().with_where(WhereFilter::new("name", "like", json!("W%")));
        assert_eq!(matching(&like), vec![1, 7]);
    }

    #[test]
    fn test_equal_ignore_case() {
        let exact = QueryRequest::new().with_where(WhereFilter::new("category", "equal", json!("TOYS")));
        assert!(matching(&exact).is_empty());

        let folded = QueryRequest::new()
            .with_where(WhereFilter::new("category", "equal", json!("TOYS")).case_insensitive());
        assert_eq!(matching(&folded), vec![4, 6]);
    }

    #[test]
    fn test_date_and_boolean_filters() {
        let before = QueryRequest::new()
            .with_where(WhereFilter::new("added", "lessthan", json!("2024-02-21")));
        assert_eq!(matching(&before), vec![1, 2, 3]);

        let out = QueryRequest::new().with_where(WhereFilter::new("in_stock", "equal", json!("false")));
        assert_eq!(matching(&out), vec![3, 6]);

        let undated = QueryRequest::new().with_where(WhereFilter::new("added", "isnull", Value::Null));
        assert_eq!(matching(&undated), vec![6]);
    }

    #[test]
    fn test_first_predicate_condition_combines() {
        let and = QueryRequest::new()
            .with_where(WhereFilter::new("category", "equal", json!("tools")).with_condition("and"))
            .with_where(WhereFilter::new("price", "equal", json!(25)));
        assert_eq!(matching(&and), vec![1, 7]);

        let or = QueryRequest::new()
            .with_where(WhereFilter::new("category", "equal", json!("toys")).with_condition("or"))
            .with_where(WhereFilter::new("price", "lessthan", json!(1)));
        assert_eq!(matching(&or), vec![4, 5, 6, 8]);

        // Only the first predicate's condition counts.
        let ignored = QueryRequest::new()
            .with_where(WhereFilter::new("category", "equal", json!("toys")))
            .with_where(WhereFilter::new("price", "lessthan", json!(1)).with_condition("or"));
        assert!(matching(&ignored).is_empty());
    }

    #[test]
    fn test_complex_predicates_nest() {
        let request = QueryRequest::new().with_where(WhereFilter::complex(
            "and",
            vec![
                WhereFilter::new("category", "notequal", json!("parts")),
                WhereFilter::complex(
                    "or",
                    vec![
                        WhereFilter::new("price", "equal", json!(12)),
                        WhereFilter::new("name", "equal", json!("Gadget")),
                    ],
                ),
            ],
        ));
        assert_eq!(matching(&request), vec![2, 6]);
    }

    #[test]
    fn test_search_terms() {
        let request = QueryRequest::new().with_search(SearchFilter::new("TOOL"));
        assert_eq!(matching(&request), vec![1, 2, 7]);

        let sensitive = QueryRequest::new().with_search(SearchFilter::new("TOOL").case_sensitive());
        assert!(matching(&sensitive).is_empty());

        let by_id = QueryRequest::new().with_search(SearchFilter::new("4").in_fields(&["id"]));
        assert_eq!(matching(&by_id), vec![4]);

        let starts = QueryRequest::new()
            .with_search(SearchFilter::new("s").in_fields(&["name"]).with_operator("startswith"));
        assert_eq!(matching(&starts), vec![3]);

        let bad = QueryRequest::new().with_search(SearchFilter::new("x").with_operator("greaterthan"));
        assert!(matches!(plan(&bad), Err(EngineError::InvalidRequest(_))));
    }

    #[test]
    fn test_page_sentinels() {
        let p = plan(&QueryRequest::new().page(2, 3)).unwrap();
        assert_eq!(p.page(vec![1, 2, 3, 4, 5, 6]), vec![3, 4, 5]);

        let p = plan(&QueryRequest::new().page(4, 0)).unwrap();
        assert_eq!(p.page(vec![1, 2, 3, 4, 5, 6]), vec![5, 6]);

        let p = plan(&QueryRequest::new().page(10, 2)).unwrap();
        assert!(p.page(vec![1, 2, 3]).is_empty());
    }
}
