//! Aggregate functions.

use std::cmp::Ordering;

use serde_json::Value;

use crate::error::{EngineError, EngineResult};
use crate::record::Field;
use crate::result::Aggregates;

use super::helpers::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Sum,
    Average,
    Min,
    Max,
    Count,
    TrueCount,
    FalseCount,
}

impl AggregateFunction {
    pub fn parse(name: &str) -> EngineResult<Self> {
        let function = match name.trim().to_ascii_lowercase().as_str() {
            "sum" => AggregateFunction::Sum,
            "average" | "avg" => AggregateFunction::Average,
            "min" => AggregateFunction::Min,
            "max" => AggregateFunction::Max,
            "count" => AggregateFunction::Count,
            "truecount" => AggregateFunction::TrueCount,
            "falsecount" => AggregateFunction::FalseCount,
            _ => {
                return Err(EngineError::invalid(format!(
                    "unknown aggregate type '{}'",
                    name
                )))
            }
        };
        Ok(function)
    }

    pub fn name(self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Average => "average",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Count => "count",
            AggregateFunction::TrueCount => "truecount",
            AggregateFunction::FalseCount => "falsecount",
        }
    }
}

/// A resolved aggregate spec.
pub(crate) struct AggregatePlan<R> {
    /// Result key, `"<field> - <type>"`.
    pub label: String,
    pub field: Field<R>,
    pub function: AggregateFunction,
}

impl<R> AggregatePlan<R> {
    pub fn new(field: Field<R>, function: AggregateFunction) -> Self {
        Self {
            label: format!("{} - {}", field.name, function.name()),
            field,
            function,
        }
    }

    pub fn compute(&self, records: &[&R]) -> Value {
        let values = records.iter().map(|r| self.field.value(r));

        match self.function {
            AggregateFunction::Count => Value::Number(serde_json::Number::from(records.len())),
            AggregateFunction::Sum => {
                let sum: f64 = values.filter_map(|v| v.as_f64()).sum();
                Value::Number(number_from_f64(sum))
            }
            AggregateFunction::Average => {
                let mut sum = 0.0;
                let mut count = 0;
                for n in values.filter_map(|v| v.as_f64()) {
                    sum += n;
                    count += 1;
                }
                if count > 0 {
                    Value::Number(number_from_f64(sum / count as f64))
                } else {
                    Value::Null
                }
            }
            AggregateFunction::Min => extreme(values, Ordering::Less),
            AggregateFunction::Max => extreme(values, Ordering::Greater),
            AggregateFunction::TrueCount => {
                let n = values.filter(|v| v.is_boolean() && to_bool(v)).count();
                Value::Number(serde_json::Number::from(n))
            }
            AggregateFunction::FalseCount => {
                let n = values.filter(|v| *v == Value::Bool(false)).count();
                Value::Number(serde_json::Number::from(n))
            }
        }
    }
}

/// First non-null value that beats every other in direction `wanted`.
fn extreme(values: impl Iterator<Item = Value>, wanted: Ordering) -> Value {
    let mut best: Option<Value> = None;
    for val in values.filter(|v| !v.is_null()) {
        best = Some(match best {
            None => val,
            Some(current) => {
                if compare_values(&val, &current) == wanted {
                    val
                } else {
                    current
                }
            }
        });
    }
    best.unwrap_or(Value::Null)
}

/// Compute every plan over `records`.
pub(crate) fn compute_all<R>(plans: &[AggregatePlan<R>], records: &[&R]) -> Aggregates {
    plans
        .iter()
        .map(|plan| (plan.label.clone(), plan.compute(records)))
        .collect()
}
