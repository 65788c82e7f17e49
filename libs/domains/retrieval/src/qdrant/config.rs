use core_config::{env_optional, env_or_default, env_parse};

use crate::error::VectorResult;

pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Qdrant connection configuration
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    /// gRPC endpoint.
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl QdrantConfig {
    pub fn new(url: String) -> Self {
        Self {
            url,
            api_key: None,
            timeout_secs: 30,
        }
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn from_env() -> VectorResult<Self> {
        Ok(Self {
            url: env_or_default("QDRANT_URL", DEFAULT_QDRANT_URL),
            api_key: env_optional("QDRANT_API_KEY"),
            timeout_secs: env_parse("QDRANT_TIMEOUT_SECS", 30)?,
        })
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self::new(DEFAULT_QDRANT_URL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VectorError;

    #[test]
    fn test_from_env_defaults() {
        temp_env::with_vars(
            [
                ("QDRANT_URL", None::<&str>),
                ("QDRANT_API_KEY", None),
                ("QDRANT_TIMEOUT_SECS", None),
            ],
            || {
                let config = QdrantConfig::from_env().unwrap();
                assert_eq!(config.url, DEFAULT_QDRANT_URL);
                assert!(config.api_key.is_none());
                assert_eq!(config.timeout_secs, 30);
            },
        );
    }

    #[test]
    fn test_from_env_bad_timeout() {
        temp_env::with_var("QDRANT_TIMEOUT_SECS", Some("soon"), || {
            let err = QdrantConfig::from_env().unwrap_err();
            assert!(matches!(err, VectorError::Config(ref msg) if msg.contains("QDRANT_TIMEOUT_SECS")));
        });
    }
}
