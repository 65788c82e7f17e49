use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::VectorResult;
use crate::models::{CollectionSpec, Document, InsertReport, QueryResult, SearchRequest};

/// Vector store backends this crate can talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoreBackend {
    #[default]
    Milvus,
    Qdrant,
    Memory,
}

/// Client for a vector store
///
/// One explicitly constructed value per connection, owned by whoever built it. Every failure
/// of the underlying service surfaces as `VectorError::StoreUnavailable`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreClient: Send + Sync {
    fn backend(&self) -> StoreBackend;

    // ===== Collection Management =====

    async fn has_collection(&self, name: &str) -> VectorResult<bool>;

    /// Create a collection with the given dimensionality and key policy
    async fn create_collection(&self, spec: &CollectionSpec) -> VectorResult<()>;

    async fn list_collections(&self) -> VectorResult<Vec<String>>;

    // ===== Data =====

    /// Insert a batch in a single call
    async fn insert(&self, collection: &str, documents: Vec<Document>)
    -> VectorResult<InsertReport>;

    /// Similarity search; the outer list is indexed by query vector
    async fn search(
        &self,
        collection: &str,
        request: SearchRequest,
    ) -> VectorResult<Vec<Vec<QueryResult>>>;
}
