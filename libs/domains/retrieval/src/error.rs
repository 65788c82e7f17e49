use core_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorError {
    /// Connection, existence check, create, list, insert or search against the store failed.
    #[error("Vector store unavailable: {0}")]
    StoreUnavailable(String),

    /// The embedding provider failed or returned malformed output.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Normalization hit a zero or non-finite norm.
    #[error("Degenerate embedding: vector norm is zero or not finite")]
    DegenerateEmbedding,

    #[error("Dimension mismatch: collection expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type VectorResult<T> = Result<T, VectorError>;

impl VectorError {
    pub(crate) fn store(context: &str, err: impl std::fmt::Display) -> Self {
        VectorError::StoreUnavailable(format!("{context}: {err}"))
    }
}

impl From<qdrant_client::QdrantError> for VectorError {
    fn from(err: qdrant_client::QdrantError) -> Self {
        VectorError::StoreUnavailable(format!("Qdrant: {}", err))
    }
}

impl From<ConfigError> for VectorError {
    fn from(err: ConfigError) -> Self {
        VectorError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_message() {
        let err = VectorError::DimensionMismatch {
            expected: 384,
            actual: 768,
        };
        assert_eq!(
            err.to_string(),
            "Dimension mismatch: collection expects 384, got 768"
        );
    }

    #[test]
    fn test_config_error_conversion() {
        let err: VectorError = ConfigError::MissingEnvVar("EMBEDDING_DIM".to_string()).into();
        assert!(matches!(err, VectorError::Config(ref msg) if msg.contains("EMBEDDING_DIM")));
    }

    #[test]
    fn test_store_helper_keeps_context() {
        let err = VectorError::store("insert into 'docs'", "connection refused");
        assert_eq!(
            err.to_string(),
            "Vector store unavailable: insert into 'docs': connection refused"
        );
    }
}
