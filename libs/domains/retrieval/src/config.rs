use std::sync::Arc;

use core_config::env_choice;
use tracing::info;

use crate::error::VectorResult;
use crate::memory::InMemoryStore;
use crate::milvus::{MilvusConfig, MilvusStore};
use crate::qdrant::{QdrantConfig, QdrantStore};
use crate::store::{StoreBackend, StoreClient};

/// Which store to talk to, with its connection settings.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    Milvus(MilvusConfig),
    Qdrant(QdrantConfig),
    Memory,
}

impl StoreConfig {
    /// Selects the backend with `VECTOR_STORE` (`milvus` default, `qdrant`, `memory`).
    pub fn from_env() -> VectorResult<Self> {
        let backend = env_choice("VECTOR_STORE", StoreBackend::Milvus, "milvus, qdrant, memory")?;
        Self::for_backend(backend)
    }

    /// Loads the settings of an explicitly chosen backend from the environment.
    pub fn for_backend(backend: StoreBackend) -> VectorResult<Self> {
        match backend {
            StoreBackend::Milvus => Ok(Self::Milvus(MilvusConfig::from_env()?)),
            StoreBackend::Qdrant => Ok(Self::Qdrant(QdrantConfig::from_env()?)),
            StoreBackend::Memory => Ok(Self::Memory),
        }
    }

    pub fn backend(&self) -> StoreBackend {
        match self {
            Self::Milvus(_) => StoreBackend::Milvus,
            Self::Qdrant(_) => StoreBackend::Qdrant,
            Self::Memory => StoreBackend::Memory,
        }
    }

    /// Build the client and check that the server answers.
    pub async fn connect(self) -> VectorResult<Arc<dyn StoreClient>> {
        let store: Arc<dyn StoreClient> = match self {
            Self::Milvus(config) => Arc::new(MilvusStore::connect(config).await?),
            Self::Qdrant(config) => Arc::new(QdrantStore::connect(config).await?),
            Self::Memory => {
                info!("Using in-memory vector store");
                Arc::new(InMemoryStore::new())
            }
        };
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VectorError;

    #[test]
    fn test_from_env_defaults_to_milvus() {
        temp_env::with_vars(
            [("VECTOR_STORE", None::<&str>), ("MILVUS_HOST", None)],
            || {
                let config = StoreConfig::from_env().unwrap();
                assert_eq!(config.backend(), StoreBackend::Milvus);
                let StoreConfig::Milvus(milvus) = config else {
                    panic!("expected milvus config");
                };
                assert_eq!(milvus.uri, "http://127.0.0.1:19530");
            },
        );
    }

    #[test]
    fn test_from_env_qdrant() {
        temp_env::with_vars(
            [
                ("VECTOR_STORE", Some("Qdrant")),
                ("QDRANT_URL", Some("http://qdrant:6334")),
            ],
            || {
                let StoreConfig::Qdrant(qdrant) = StoreConfig::from_env().unwrap() else {
                    panic!("expected qdrant config");
                };
                assert_eq!(qdrant.url, "http://qdrant:6334");
            },
        );
    }

    #[test]
    fn test_from_env_rejects_unknown_backend() {
        temp_env::with_var("VECTOR_STORE", Some("faiss"), || {
            let err = StoreConfig::from_env().unwrap_err();
            assert!(matches!(err, VectorError::Config(ref msg) if msg.contains("faiss")));
        });
    }

    #[tokio::test]
    async fn test_connect_memory() {
        let store = StoreConfig::Memory.connect().await.unwrap();
        assert_eq!(store.backend(), StoreBackend::Memory);
        assert!(store.list_collections().await.unwrap().is_empty());
    }
}
