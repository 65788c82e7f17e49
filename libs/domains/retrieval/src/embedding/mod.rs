mod hashing;
mod openai;
mod provider;

use std::sync::Arc;

use core_config::{env_choice, env_parse};
use tracing::info;

pub use hashing::{DEFAULT_HASHING_DIM, HashingProvider};
pub use openai::{OpenAIConfig, OpenAIProvider, known_dimension};
pub use provider::{EmbeddingProvider, EmbeddingProviderType, EmbeddingResult};

#[cfg(test)]
pub use provider::MockEmbeddingProvider;

use crate::error::VectorResult;

/// Which embedder to build, with its settings.
#[derive(Debug, Clone)]
pub enum EmbedderConfig {
    OpenAI(OpenAIConfig),
    Hashing { dimension: usize },
}

impl EmbedderConfig {
    /// Selects the provider with `EMBEDDING_PROVIDER` (`openai` default, `hashing`).
    pub fn from_env() -> VectorResult<Self> {
        let kind = env_choice(
            "EMBEDDING_PROVIDER",
            EmbeddingProviderType::OpenAI,
            "openai, hashing",
        )?;
        Self::for_provider(kind)
    }

    /// Loads the settings of an explicitly chosen provider from the environment.
    pub fn for_provider(kind: EmbeddingProviderType) -> VectorResult<Self> {
        match kind {
            EmbeddingProviderType::OpenAI => Ok(Self::OpenAI(OpenAIConfig::from_env()?)),
            EmbeddingProviderType::Hashing => Ok(Self::Hashing {
                dimension: env_parse("HASHING_DIM", DEFAULT_HASHING_DIM)?,
            }),
        }
    }

    pub fn provider_type(&self) -> EmbeddingProviderType {
        match self {
            Self::OpenAI(_) => EmbeddingProviderType::OpenAI,
            Self::Hashing { .. } => EmbeddingProviderType::Hashing,
        }
    }

    pub fn build(self) -> VectorResult<Arc<dyn EmbeddingProvider>> {
        let provider: Arc<dyn EmbeddingProvider> = match self {
            Self::OpenAI(config) => {
                info!(
                    base_url = %config.base_url,
                    model = %config.model,
                    dimension = config.dimension,
                    "OpenAI-compatible embedding provider configured"
                );
                Arc::new(OpenAIProvider::new(config)?)
            }
            Self::Hashing { dimension } => {
                info!(dimension, "Hashing embedding provider configured");
                Arc::new(HashingProvider::new(dimension)?)
            }
        };
        Ok(provider)
    }
}
