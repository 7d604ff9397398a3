use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("clause is empty")]
    EmptyClause,

    #[error("unsupported jurisdiction: {0:?}")]
    UnsupportedJurisdiction(String),

    #[error("policy file {path:?}: {source}")]
    PolicyParse {
        path: std::path::PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Malformed top-level input, the only class reported back to callers.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Self::EmptyClause | Self::UnsupportedJurisdiction(_))
    }
}
