use core_config::{ConfigError, Environment, FromEnv, env_choice};
use domain_retrieval::{EmbeddingProviderType, StoreBackend};

use crate::cli::Cli;

/// Runtime selection resolved from CLI flags and the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub environment: Environment,
    pub store: StoreBackend,
    pub embedder: EmbeddingProviderType,
}

fn store_from_env() -> Result<StoreBackend, ConfigError> {
    env_choice("VECTOR_STORE", StoreBackend::Milvus, "milvus, qdrant, memory")
}

fn embedder_from_env() -> Result<EmbeddingProviderType, ConfigError> {
    env_choice(
        "EMBEDDING_PROVIDER",
        EmbeddingProviderType::OpenAI,
        "openai, hashing",
    )
}

impl FromEnv for Settings {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            environment: Environment::from_env(),
            store: store_from_env()?,
            embedder: embedder_from_env()?,
        })
    }
}

impl Settings {
    /// Flags given on the command line win; the environment is only read for the rest.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let store = match cli.store {
            Some(store) => store,
            None => store_from_env()?,
        };
        let embedder = match cli.embedder {
            Some(embedder) => embedder,
            None => embedder_from_env()?,
        };
        Ok(Self {
            environment: Environment::from_env(),
            store,
            embedder,
        })
    }
}
