use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum PendantError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Parsing Error in {0}: {1}")]
    ParseError(&'static str, String),

    #[error("Graph Error: {0}")]
    Graph(String),

    #[error("Module Not Found: {0}")]
    NotFound(String),

    #[error("Walk Error: {0}")]
    Walk(String),
}

impl From<std::io::Error> for PendantError {
    fn from(err: std::io::Error) -> Self {
        PendantError::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for PendantError {
    fn from(err: serde_json::Error) -> Self {
        PendantError::Json(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, PendantError>;
