//! Grid data adaptor.
//!
//! [`GridAdaptor`] is the surface a grid's custom-binding layer talks to:
//! `read`, `insert`, `remove` and `update` over JSON values, the way the grid
//! posts them. Every call takes the engine lock for its whole duration, so an
//! adaptor can be cloned into as many request handlers as needed.

use std::sync::Arc;

use gridbind_core::{EngineOptions, QueryEngine, QueryRequest, QueryResult, Record};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{GridError, GridResult};

pub struct GridAdaptor<R: Record> {
    engine: Arc<Mutex<QueryEngine<R>>>,
}

impl<R: Record> Clone for GridAdaptor<R> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<R> GridAdaptor<R>
where
    R: Record + Serialize + DeserializeOwned,
{
    pub fn new(engine: QueryEngine<R>) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }

    /// Build the engine over `records` with `options`.
    pub fn with_records(records: Vec<R>, options: EngineOptions) -> GridResult<Self> {
        Ok(Self::new(QueryEngine::with_options(records, options)?))
    }

    pub fn len(&self) -> usize {
        self.engine.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.engine.lock().is_empty()
    }

    /// Snapshot of the collection.
    pub fn records(&self) -> Vec<R> {
        self.engine.lock().records().to_vec()
    }

    /// Typed read.
    pub fn query(&self, request: &QueryRequest) -> GridResult<QueryResult<R>> {
        Ok(self.engine.lock().query(request)?)
    }

    /// Read, serialized the way the grid expects.
    pub fn read(&self, request: &QueryRequest) -> GridResult<Value> {
        let result = self.query(request)?;
        Ok(serde_json::to_value(&result)?)
    }

    /// Insert a posted record at the head of the collection; echoes the record.
    pub fn insert(&self, value: Value) -> GridResult<Value> {
        let record: R = serde_json::from_value(value)?;
        let inserted = self.engine.lock().insert(record);
        Ok(serde_json::to_value(&inserted)?)
    }

    /// Remove by key; echoes the key whether or not a record was removed.
    pub fn remove(&self, key: Value, key_column: &str) -> GridResult<Value> {
        check_key_column::<R>(key_column)?;
        self.engine.lock().remove(key.clone());
        Ok(key)
    }

    /// Like [`GridAdaptor::remove`], but an absent key is an error.
    pub fn remove_strict(&self, key: Value, key_column: &str) -> GridResult<Value> {
        check_key_column::<R>(key_column)?;
        self.engine.lock().try_remove(key.clone())?;
        Ok(key)
    }

    /// Update by key; returns the updated record, or `null` when absent.
    pub fn update(&self, value: Value, key_column: &str) -> GridResult<Value> {
        check_key_column::<R>(key_column)?;
        let record: R = serde_json::from_value(value)?;
        match self.engine.lock().update(record) {
            Some(updated) => Ok(serde_json::to_value(&updated)?),
            None => Ok(Value::Null),
        }
    }

    /// Like [`GridAdaptor::update`], but an absent key is an error.
    pub fn update_strict(&self, value: Value, key_column: &str) -> GridResult<Value> {
        check_key_column::<R>(key_column)?;
        let record: R = serde_json::from_value(value)?;
        let updated = self.engine.lock().try_update(record)?;
        Ok(serde_json::to_value(&updated)?)
    }
}

fn check_key_column<R: Record>(key_column: &str) -> GridResult<()> {
    if key_column == R::KEY_FIELD {
        Ok(())
    } else {
        Err(GridError::KeyColumnMismatch {
            given: key_column.to_string(),
            expected: R::KEY_FIELD,
        })
    }
}
