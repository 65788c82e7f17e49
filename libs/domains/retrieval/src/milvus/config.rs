use core_config::{env_optional, env_or_default, env_parse};

use crate::error::VectorResult;

pub const DEFAULT_MILVUS_URI: &str = "http://127.0.0.1:19530";

/// Milvus connection configuration
#[derive(Debug, Clone)]
pub struct MilvusConfig {
    pub uri: String,
    /// Bearer credential: an API key or `user:password`.
    pub token: Option<String>,
    /// Database name; the server default is used when unset.
    pub db_name: Option<String>,
    pub timeout_secs: u64,
}

impl MilvusConfig {
    pub fn new(uri: impl AsRef<str>) -> Self {
        Self {
            uri: normalize_uri(uri.as_ref()),
            token: None,
            db_name: None,
            timeout_secs: 30,
        }
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_db_name(mut self, db_name: String) -> Self {
        self.db_name = Some(db_name);
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Reads `MILVUS_HOST` (default `http://127.0.0.1:19530`), `MILVUS_TOKEN`, `MILVUS_DB`
    /// and `MILVUS_TIMEOUT_SECS` (default 30).
    pub fn from_env() -> VectorResult<Self> {
        Ok(Self {
            uri: normalize_uri(&env_or_default("MILVUS_HOST", DEFAULT_MILVUS_URI)),
            token: env_optional("MILVUS_TOKEN"),
            db_name: env_optional("MILVUS_DB"),
            timeout_secs: env_parse("MILVUS_TIMEOUT_SECS", 30)?,
        })
    }

    /// Absolute URL of a REST v2 endpoint, e.g. `collections/has`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/v2/vectordb/{}", self.uri, path)
    }
}

impl Default for MilvusConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MILVUS_URI)
    }
}

/// Bare `host:port` gets an `http://` scheme; trailing slashes are dropped.
fn normalize_uri(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}
