use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};

use crate::collection::CollectionManager;
use crate::embedding::EmbeddingProvider;
use crate::error::VectorResult;
use crate::ingest::IngestionPipeline;
use crate::models::{
    CollectionHandle, CollectionSpec, CollectionStatus, ConsistencyLevel, InsertReport,
    QueryResult, TextRecord,
};
use crate::query::QueryPipeline;
use crate::store::StoreClient;

/// Outcome of one smoke run: what was found or created, what was written, what came back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmokeReport {
    pub collection: CollectionHandle,
    pub status: CollectionStatus,
    /// `None` when the collection already existed and ingestion was skipped.
    pub inserted: Option<InsertReport>,
    pub results: Vec<QueryResult>,
}

/// Retrieval service tying a store client to an embedding provider
///
/// Both are explicit values owned here; nothing is global.
pub struct RetrievalService<S: StoreClient + ?Sized> {
    store: Arc<S>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl<S: StoreClient + ?Sized> Clone for RetrievalService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            embedder: Arc::clone(&self.embedder),
        }
    }
}

impl<S: StoreClient + ?Sized> RetrievalService<S> {
    pub fn new(store: Arc<S>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embedder }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn embedder(&self) -> &dyn EmbeddingProvider {
        self.embedder.as_ref()
    }

    /// Collection settings sized to this service's embedder.
    pub fn collection_spec(&self, name: impl Into<String>) -> CollectionSpec {
        CollectionSpec::new(name, self.embedder.dimension())
    }

    pub async fn ensure_collection(
        &self,
        spec: &CollectionSpec,
    ) -> VectorResult<(CollectionHandle, CollectionStatus)> {
        CollectionManager::new(self.store.as_ref())
            .ensure_collection(spec)
            .await
    }

    pub async fn ingest(
        &self,
        handle: &CollectionHandle,
        records: &[TextRecord],
    ) -> VectorResult<InsertReport> {
        IngestionPipeline::new(self.store.as_ref(), self.embedder.as_ref())
            .ingest(handle, records)
            .await
    }

    pub async fn query(
        &self,
        handle: &CollectionHandle,
        text: &str,
        top_k: usize,
        consistency: ConsistencyLevel,
    ) -> VectorResult<Vec<QueryResult>> {
        QueryPipeline::new(self.store.as_ref(), self.embedder.as_ref())
            .query(handle, text, top_k, consistency)
            .await
    }

    /// Ensure the collection, seed it only if it was just created, then query it.
    #[instrument(skip(self, spec, records, query_text), fields(collection = %spec.name))]
    pub async fn seed_and_query(
        &self,
        spec: &CollectionSpec,
        records: &[TextRecord],
        query_text: &str,
        top_k: usize,
        consistency: ConsistencyLevel,
    ) -> VectorResult<SmokeReport> {
        let (handle, status) = self.ensure_collection(spec).await?;

        let inserted = if status.is_created() {
            Some(self.ingest(&handle, records).await?)
        } else {
            info!("Collection already populated, skipping ingestion");
            None
        };

        let results = self.query(&handle, query_text, top_k, consistency).await?;

        Ok(SmokeReport {
            collection: handle,
            status,
            inserted,
            results,
        })
    }
}
