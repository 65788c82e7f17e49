use std::time::Duration;

use async_trait::async_trait;
use core_config::{env_optional, env_or_default, env_parse};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EmbeddingProvider, EmbeddingProviderType, EmbeddingResult};
use crate::error::{VectorError, VectorResult};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Native output dimension of well-known hosted models.
pub fn known_dimension(model: &str) -> Option<usize> {
    match model {
        "text-embedding-3-small" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        "text-embedding-ada-002" => Some(1536),
        "all-MiniLM-L6-v2" | "sentence-transformers/all-MiniLM-L6-v2" => Some(384),
        "BAAI/bge-small-en-v1.5" => Some(384),
        "BAAI/bge-base-en-v1.5" | "nomic-embed-text" => Some(768),
        _ => None,
    }
}

/// OpenAI-compatible embedding endpoint configuration
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Optional: self-hosted servers usually run without a key.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub dimension: usize,
    /// Ask the server to shorten its output to `dimension` (text-embedding-3 models only).
    pub request_dimensions: bool,
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    /// Config for a model with a known native dimension.
    pub fn new(model: impl Into<String>, dimension: usize) -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            dimension,
            request_dimensions: false,
            timeout_secs: 60,
        }
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Reads:
    /// - `OPENAI_BASE_URL` (default `https://api.openai.com/v1`)
    /// - `OPENAI_API_KEY` (optional)
    /// - `EMBEDDING_MODEL` (default `text-embedding-3-small`)
    /// - `EMBEDDING_DIM` (required for models missing from the known table)
    /// - `EMBEDDING_TIMEOUT_SECS` (default 60)
    pub fn from_env() -> VectorResult<Self> {
        let base_url = env_or_default("OPENAI_BASE_URL", DEFAULT_BASE_URL);
        let api_key = env_optional("OPENAI_API_KEY");
        let model = env_or_default("EMBEDDING_MODEL", DEFAULT_MODEL);
        let explicit_dim = env_optional("EMBEDDING_DIM")
            .map(|raw| {
                raw.trim().parse::<usize>().map_err(|e| {
                    VectorError::Config(format!("EMBEDDING_DIM must be a positive integer: {e}"))
                })
            })
            .transpose()?;

        let native = known_dimension(&model);
        let dimension = explicit_dim.or(native).ok_or_else(|| {
            VectorError::Config(format!(
                "EMBEDDING_DIM not set and model '{model}' has no known dimension"
            ))
        })?;
        if dimension == 0 {
            return Err(VectorError::Config("EMBEDDING_DIM must be > 0".to_string()));
        }

        let request_dimensions = model.starts_with("text-embedding-3")
            && native.is_some_and(|native| native != dimension);

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            dimension,
            request_dimensions,
            timeout_secs: env_parse("EMBEDDING_TIMEOUT_SECS", 60)?,
        })
    }
}

/// Embeddings over the OpenAI `/embeddings` protocol
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> VectorResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VectorError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> VectorResult<Self> {
        Self::new(OpenAIConfig::from_env()?)
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    #[serde(default)]
    usage: Option<EmbeddingUsage>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct EmbeddingUsage {
    prompt_tokens: u32,
    total_tokens: u32,
}

fn into_results(
    response: EmbeddingResponse,
    expected: usize,
) -> VectorResult<Vec<EmbeddingResult>> {
    if response.data.len() != expected {
        return Err(VectorError::Embedding(format!(
            "Embedding API returned {} vectors for {} inputs",
            response.data.len(),
            expected
        )));
    }

    // Sort by index to maintain order
    let mut data = response.data;
    data.sort_by_key(|d| d.index);

    let tokens_per_embedding = response
        .usage
        .map(|u| u.total_tokens / expected as u32)
        .unwrap_or(0);

    Ok(data
        .into_iter()
        .map(|d| EmbeddingResult {
            values: d.embedding,
            tokens_used: tokens_per_embedding,
        })
        .collect())
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn provider_type(&self) -> EmbeddingProviderType {
        EmbeddingProviderType::OpenAI
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed(&self, text: &str) -> VectorResult<EmbeddingResult> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| VectorError::Embedding("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> VectorResult<Vec<EmbeddingResult>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let request = EmbeddingRequest {
            model: &self.config.model,
            input: texts,
            dimensions: self
                .config
                .request_dimensions
                .then_some(self.config.dimension),
        };

        debug!(model = %self.config.model, inputs = texts.len(), "Requesting embeddings");

        let mut builder = self
            .client
            .post(format!("{}/embeddings", self.config.base_url))
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| VectorError::Embedding(format!("Embedding API unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VectorError::Embedding(format!(
                "Embedding API error ({}): {}",
                status, error_text
            )));
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| VectorError::Embedding(format!("Malformed embedding response: {}", e)))?;

        into_results(embedding_response, texts.len())
    }
}
