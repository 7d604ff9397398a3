use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("vector dimension mismatch: index has {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("vector table is missing column {0:?}")]
    MissingColumn(&'static str),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "lancedb")]
    #[error("lancedb error: {0}")]
    Lance(#[from] lancedb::Error),

    #[cfg(feature = "lancedb")]
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("{0}")]
    Other(String),
}
