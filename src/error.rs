use gridbind_core::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] serde_json::Error),

    #[error("Key column '{given}' does not match the record key '{expected}'")]
    KeyColumnMismatch {
        given: String,
        expected: &'static str,
    },

    #[error("Script line {line}: {source}")]
    Script {
        line: usize,
        #[source]
        source: Box<GridError>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type GridResult<T> = Result<T, GridError>;

impl GridError {
    /// True for request-shaped failures the caller can fix.
    pub fn is_invalid_request(&self) -> bool {
        match self {
            GridError::Engine(EngineError::InvalidRequest(_))
            | GridError::InvalidRecord(_)
            | GridError::KeyColumnMismatch { .. } => true,
            GridError::Script { source, .. } => source.is_invalid_request(),
            _ => false,
        }
    }
}
