//! Grouping stage.
//!
//! Records are partitioned by successive group-by fields, nesting one level per
//! field. Groups keep the order in which their first member appears, so a
//! preceding sort decides group order too.

use indexmap::IndexMap;
use serde_json::Value;

use crate::record::Field;
use crate::result::{Group, ResultSet};

use super::aggregate::{compute_all, AggregatePlan};
use super::helpers::number_key;

/// Bucket identity for a group value; numerically equal numbers share a bucket.
fn bucket_key(value: &Value) -> String {
    match value {
        Value::Number(n) => format!("n:{}", number_key(n)),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

pub(crate) fn group_records<R: Clone>(
    records: &[&R],
    keys: &[Field<R>],
    aggregates: &[AggregatePlan<R>],
) -> Vec<Group<R>> {
    let Some((field, rest)) = keys.split_first() else {
        return Vec::new();
    };

    let mut buckets: IndexMap<String, (Value, Vec<&R>)> = IndexMap::new();
    for &record in records {
        let key = field.value(record);
        buckets
            .entry(bucket_key(&key))
            .or_insert_with(|| (key, Vec::new()))
            .1
            .push(record);
    }

    buckets
        .into_values()
        .map(|(key, members)| {
            let items = if rest.is_empty() {
                ResultSet::Records(members.iter().map(|r| (*r).clone()).collect())
            } else {
                ResultSet::Groups(group_records(&members, rest, aggregates))
            };
            Group {
                field: field.name.to_string(),
                key,
                count: members.len(),
                items,
                aggregates: compute_all(aggregates, &members),
            }
        })
        .collect()
}
