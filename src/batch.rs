//! JSON-lines operation scripts.
//!
//! Each non-blank line is one operation against a shared adaptor:
//!
//! ```text
//! {"action": "insert", "value": {"OrderID": 1, "CustomerID": "ALFKI"}}
//! {"action": "remove", "key": 1001}
//! {"action": "update", "value": {"OrderID": 1002, "Freight": 9.5}, "strict": true}
//! {"action": "read", "request": {"take": 5, "requiresCounts": true}}
//! ```

use std::io::BufRead;

use gridbind_core::{QueryRequest, Record};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adaptor::GridAdaptor;
use crate::error::{GridError, GridResult};

/// A single adaptor call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Operation {
    Read {
        #[serde(default)]
        request: QueryRequest,
    },
    Insert {
        value: Value,
    },
    #[serde(rename_all = "camelCase")]
    Remove {
        key: Value,
        #[serde(default)]
        key_column: Option<String>,
        #[serde(default)]
        strict: bool,
    },
    #[serde(rename_all = "camelCase")]
    Update {
        value: Value,
        #[serde(default)]
        key_column: Option<String>,
        #[serde(default)]
        strict: bool,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Read { .. } => "read",
            Operation::Insert { .. } => "insert",
            Operation::Remove { .. } => "remove",
            Operation::Update { .. } => "update",
        }
    }

    /// Run against `adaptor`. A missing key column defaults to the record key.
    pub fn apply<R>(self, adaptor: &GridAdaptor<R>) -> GridResult<Value>
    where
        R: Record + Serialize + DeserializeOwned,
    {
        match self {
            Operation::Read { request } => adaptor.read(&request),
            Operation::Insert { value } => adaptor.insert(value),
            Operation::Remove {
                key,
                key_column,
                strict,
            } => {
                let column = key_column.as_deref().unwrap_or(R::KEY_FIELD);
                if strict {
                    adaptor.remove_strict(key, column)
                } else {
                    adaptor.remove(key, column)
                }
            }
            Operation::Update {
                value,
                key_column,
                strict,
            } => {
                let column = key_column.as_deref().unwrap_or(R::KEY_FIELD);
                if strict {
                    adaptor.update_strict(value, column)
                } else {
                    adaptor.update(value, column)
                }
            }
        }
    }
}

/// Run every operation in `reader`, stopping at the first failure.
///
/// Errors carry the 1-based line number they came from.
pub fn run_script<R, B>(adaptor: &GridAdaptor<R>, reader: B) -> GridResult<Vec<Value>>
where
    R: Record + Serialize + DeserializeOwned,
    B: BufRead,
{
    let mut results = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let at_line = |source: GridError| GridError::Script {
            line: line_no,
            source: Box::new(source),
        };

        let line = line.map_err(|e| at_line(e.into()))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let op: Operation = serde_json::from_str(line).map_err(|e| at_line(e.into()))?;
        tracing::debug!(line = line_no, action = op.name(), "Running operation");
        results.push(op.apply(adaptor).map_err(at_line)?);
    }

    tracing::info!(operations = results.len(), "Script finished");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Order;
    use gridbind_core::EngineOptions;
    use serde_json::json;

    fn adaptor() -> GridAdaptor<Order> {
        GridAdaptor::with_records(
            vec![Order::new(1001, "ALFKI", 1.5)],
            EngineOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_operations() {
        let op: Operation =
            serde_json::from_value(json!({"action": "remove", "key": 1001})).unwrap();
        assert_eq!(
            op,
            Operation::Remove {
                key: json!(1001),
                key_column: None,
                strict: false
            }
        );

        let op: Operation = serde_json::from_value(json!({
            "action": "update",
            "value": {"OrderID": 1},
            "keyColumn": "OrderID",
            "strict": true
        }))
        .unwrap();
        assert!(matches!(op, Operation::Update { strict: true, .. }));

        let op: Operation = serde_json::from_value(json!({"action": "read"})).unwrap();
        assert_eq!(op.name(), "read");

        assert!(serde_json::from_value::<Operation>(json!({"action": "drop"})).is_err());
    }

    #[test]
    fn test_run_script() {
        let adaptor = adaptor();
        let script = r#"
{"action": "insert", "value": {"OrderID": 1, "CustomerID": "BOLID", "Freight": 2.0}}

{"action": "update", "value": {"OrderID": 1001, "CustomerID": "ANTON", "Freight": 4.0}}
{"action": "remove", "key": 42}
{"action": "read", "request": {"requiresCounts": true}}
"#;
        let results = run_script(&adaptor, script.as_bytes()).unwrap();
        assert_eq!(results.len(), 4);
        assert_eq!(results[0]["OrderID"], json!(1));
        assert_eq!(results[1]["CustomerID"], json!("ANTON"));
        assert_eq!(results[2], json!(42));
        assert_eq!(results[3]["count"], json!(2));
        assert_eq!(results[3]["result"][0]["OrderID"], json!(1));
    }

    #[test]
    fn test_script_error_reports_line() {
        let adaptor = adaptor();
        let script = "{\"action\": \"remove\", \"key\": 1001}\n\n{\"action\": \"remove\", \"key\": 1001, \"strict\": true}\n";
        let err = run_script(&adaptor, script.as_bytes()).unwrap_err();
        match err {
            GridError::Script { line, source } => {
                assert_eq!(line, 3);
                assert!(matches!(*source, GridError::Engine(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(adaptor.is_empty());
    }

    #[test]
    fn test_script_rejects_bad_json() {
        let adaptor = adaptor();
        let err = run_script(&adaptor, "not json\n".as_bytes()).unwrap_err();
        assert!(matches!(err, GridError::Script { line: 1, .. }));
        assert!(err.is_invalid_request());
    }
}
