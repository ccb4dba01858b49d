//! Record accessor tables.
//!
//! A record type declares its fields once, as a list of named getters, and
//! names its key field. The engine resolves that list into a [`FieldTable`]
//! when it is constructed; requests are compiled against the table, so no
//! per-record name inspection happens while a query runs.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::error::{EngineError, EngineResult};

/// Value domain of a field, used to coerce filter values at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    Text,
    Date,
    Boolean,
}

/// A named getter over a record type.
pub struct Field<R> {
    pub name: &'static str,
    pub kind: FieldKind,
    pub get: fn(&R) -> Value,
}

impl<R> Field<R> {
    pub fn new(name: &'static str, kind: FieldKind, get: fn(&R) -> Value) -> Self {
        Self { name, kind, get }
    }

    #[inline]
    pub fn value(&self, record: &R) -> Value {
        (self.get)(record)
    }
}

impl<R> Clone for Field<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Field<R> {}

impl<R> fmt::Debug for Field<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// A record the engine can hold.
///
/// Implementors list their fields with [`Record::fields`] and say which one is
/// the primary key. [`Record::apply_update`] copies the updatable subset of
/// fields from an incoming record onto the stored one.
pub trait Record: Clone {
    /// Name of the primary key field; must appear in [`Record::fields`].
    const KEY_FIELD: &'static str;

    fn fields() -> Vec<Field<Self>>;

    fn apply_update(&mut self, changes: &Self);
}

/// Name-to-accessor map for a record type, resolved once.
pub struct FieldTable<R> {
    fields: Vec<Field<R>>,
    by_name: HashMap<&'static str, usize>,
    key: usize,
}

impl<R> Clone for FieldTable<R> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            by_name: self.by_name.clone(),
            key: self.key,
        }
    }
}

impl<R> fmt::Debug for FieldTable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldTable")
            .field("fields", &self.fields)
            .field("key", &self.fields[self.key].name)
            .finish()
    }
}

impl<R: Record> FieldTable<R> {
    pub fn resolve() -> EngineResult<Self> {
        let fields = R::fields();
        let mut by_name = HashMap::with_capacity(fields.len());

        for (i, field) in fields.iter().enumerate() {
            if by_name.insert(field.name, i).is_some() {
                return Err(EngineError::Schema(format!(
                    "duplicate field '{}'",
                    field.name
                )));
            }
        }

        let key = *by_name.get(R::KEY_FIELD).ok_or_else(|| {
            EngineError::Schema(format!("key field '{}' is not declared", R::KEY_FIELD))
        })?;

        Ok(Self {
            fields,
            by_name,
            key,
        })
    }
}

impl<R> FieldTable<R> {
    /// Look up a field by name.
    pub fn get(&self, name: &str) -> EngineResult<&Field<R>> {
        self.by_name
            .get(name)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| EngineError::invalid(format!("unknown field '{}'", name)))
    }

    pub fn key(&self) -> &Field<R> {
        &self.fields[self.key]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field<R>> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Canonical JSON form of a date field value.
///
/// Millisecond RFC 3339 in UTC, so lexical order matches chronological order.
pub fn date_value(date: &DateTime<Utc>) -> Value {
    Value::String(canonical_date(date))
}

fn canonical_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a date from RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.f]`, or a bare
/// `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Serde adapter for `Option<DateTime<Utc>>` record fields.
///
/// Writes the same text as [`date_value`], so what the grid displays is what
/// search and text filters match. Reads anything [`parse_date`] accepts.
pub mod date_format {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_str(&super::canonical_date(date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => super::parse_date(&text)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid date '{}'", text))),
            None => Ok(None),
        }
    }
}
