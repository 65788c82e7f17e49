//! Retrieval Domain Library
//!
//! Turns text into unit-length embeddings, stores them next to their metadata in a vector
//! database and answers nearest-neighbour queries against it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │   RetrievalService   │  ← ensure → ingest (only if created) → query
//! └──────────┬───────────┘
//!            │
//! ┌──────────▼───────────┬─────────────────────┬────────────────────┐
//! │  CollectionManager   │  IngestionPipeline  │   QueryPipeline    │
//! └──────────┬───────────┴──────────┬──────────┴─────────┬──────────┘
//!            │                      │    codec::encode   │
//! ┌──────────▼───────────┐  ┌───────▼────────────────────▼─┐
//! │   StoreClient        │  │   EmbeddingProvider          │
//! │  Milvus / Qdrant /   │  │  OpenAI-compatible / Hashing │
//! │  InMemory            │  │                              │
//! └──────────────────────┘  └──────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_retrieval::{
//!     ConsistencyLevel, EmbedderConfig, RetrievalService, StoreConfig, TextRecord,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = StoreConfig::from_env()?.connect().await?;
//! let embedder = EmbedderConfig::from_env()?.build()?;
//! let service = RetrievalService::new(store, embedder);
//!
//! let spec = service.collection_spec("test_collection");
//! let records = vec![TextRecord::new("Turing researched AI.", "ai")];
//! let report = service
//!     .seed_and_query(&spec, &records, "Who was Alan Turing?", 2, ConsistencyLevel::Eventually)
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod collection;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod memory;
pub mod milvus;
pub mod models;
pub mod qdrant;
pub mod query;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use codec::{cosine_similarity, encode, l2_norm, normalize};
pub use collection::CollectionManager;
pub use config::StoreConfig;
pub use embedding::{
    EmbedderConfig, EmbeddingProvider, EmbeddingProviderType, EmbeddingResult, HashingProvider,
    OpenAIConfig, OpenAIProvider,
};
pub use error::{VectorError, VectorResult};
pub use ingest::IngestionPipeline;
pub use memory::InMemoryStore;
pub use milvus::{MilvusConfig, MilvusStore};
pub use models::{
    CollectionHandle, CollectionSpec, CollectionStatus, ConsistencyLevel, Document,
    EmbeddingVector, InsertReport, QueryResult, RecordId, SearchRequest, TextRecord,
};
pub use qdrant::{QdrantConfig, QdrantStore};
pub use query::QueryPipeline;
pub use service::{RetrievalService, SmokeReport};
pub use store::{StoreBackend, StoreClient};
