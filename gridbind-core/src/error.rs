//! Error types for gridbind-core.
//!
//! Every pipeline stage is a pure in-memory transformation, so the only
//! failures are malformed requests and absent targets.

use thiserror::Error;

/// Query engine error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid record schema: {0}")]
    Schema(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        EngineError::InvalidRequest(msg.into())
    }
}

impl serde::Serialize for EngineError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EngineError::InvalidRequest("unknown operator 'between'".to_string());
        assert_eq!(err.to_string(), "Invalid request: unknown operator 'between'");

        let err = EngineError::NotFound("OrderID 1001".to_string());
        assert_eq!(err.to_string(), "Record not found: OrderID 1001");

        let err = EngineError::Schema("missing key field".to_string());
        assert_eq!(err.to_string(), "Invalid record schema: missing key field");
    }

    #[test]
    fn test_serializes_as_message() {
        let err = EngineError::invalid("negative skip");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json, serde_json::json!("Invalid request: negative skip"));
    }
}
