//! Error types for the search core.

/// Errors surfaced by ingestion and ranking.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// Corpus statistics were requested with zero documents indexed.
    #[error("corpus is empty: no documents have been indexed")]
    EmptyCorpus,

    /// Ingestion input was rejected before touching the index.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// A ranking parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
