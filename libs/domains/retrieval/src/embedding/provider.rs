use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::VectorResult;

/// Embedding provider kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EmbeddingProviderType {
    /// Any server speaking the OpenAI `/embeddings` protocol (OpenAI, vLLM, TEI, Ollama).
    #[default]
    OpenAI,
    /// Deterministic feature hashing, no model involved.
    Hashing,
}

/// Raw (unnormalized) model output for one text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResult {
    pub values: Vec<f32>,
    pub tokens_used: u32,
}

/// Trait for embedding generation providers
///
/// Providers are deterministic for a fixed model version and return vectors of length
/// [`EmbeddingProvider::dimension`]. Normalization is the caller's job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the provider type
    fn provider_type(&self) -> EmbeddingProviderType;

    /// Output dimensionality of the model
    fn dimension(&self) -> usize;

    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> VectorResult<EmbeddingResult>;

    /// Generate embeddings for multiple texts in batch, in input order
    async fn embed_batch(&self, texts: &[String]) -> VectorResult<Vec<EmbeddingResult>>;
}
