//! gridbind core - storage-independent in-memory query engine.
//!
//! This crate holds an in-memory collection of records and answers the
//! declarative read requests a data grid sends (filter, search, sort, group,
//! aggregate, page), along with insert, remove and update. It has no I/O and
//! no host dependencies.
//!
//! # Main Components
//!
//! - **Record**: accessor-table abstraction over a record type
//! - **Request**: the grid's query request model
//! - **Executor**: [`QueryEngine`], which owns the collection and runs requests
//! - **Result**: bare sequences, groups and the count envelope
//!
//! # Example
//!
//! ```rust
//! use gridbind_core::{Field, FieldKind, QueryEngine, QueryRequest, Record, WhereFilter};
//! use serde_json::{json, Value};
//!
//! #[derive(Clone)]
//! struct Row {
//!     id: i64,
//!     city: String,
//! }
//!
//! impl Record for Row {
//!     const KEY_FIELD: &'static str = "id";
//!
//!     fn fields() -> Vec<Field<Self>> {
//!         vec![
//!             Field::new("id", FieldKind::Number, |r: &Self| Value::from(r.id)),
//!             Field::new("city", FieldKind::Text, |r: &Self| Value::from(r.city.clone())),
//!         ]
//!     }
//!
//!     fn apply_update(&mut self, changes: &Self) {
//!         self.city = changes.city.clone();
//!     }
//! }
//!
//! let engine = QueryEngine::new(vec![
//!     Row { id: 1, city: "Oslo".into() },
//!     Row { id: 2, city: "Lima".into() },
//! ])
//! .unwrap();
//!
//! let request = QueryRequest::new()
//!     .with_where(WhereFilter::new("city", "startswith", json!("L")))
//!     .with_counts();
//! let result = engine.query(&request).unwrap();
//! assert_eq!(result.count(), Some(1));
//! assert_eq!(result.records().unwrap()[0].id, 2);
//! ```

pub mod error;
pub mod executor;
pub mod record;
pub mod request;
pub mod result;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use error::{EngineError, EngineResult};
pub use executor::{
    AggregateDefault, AggregateFunction, Condition, EngineOptions, FilterOperator, GroupPaging,
    QueryEngine,
};
pub use record::{date_format, date_value, parse_date, Field, FieldKind, FieldTable, Record};
pub use request::{AggregateSpec, QueryRequest, SearchFilter, SortDescriptor, WhereFilter};
pub use result::{Aggregates, DataResult, Group, QueryResult, ResultSet};
