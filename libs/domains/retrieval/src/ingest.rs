use tracing::{debug, info, instrument};

use crate::codec::encode;
use crate::embedding::EmbeddingProvider;
use crate::error::{VectorError, VectorResult};
use crate::models::{CollectionHandle, Document, InsertReport, TextRecord};
use crate::store::StoreClient;

/// Embeds text records and writes them to a collection in one batch.
pub struct IngestionPipeline<'a, S: ?Sized> {
    store: &'a S,
    embedder: &'a dyn EmbeddingProvider,
}

impl<'a, S: StoreClient + ?Sized> IngestionPipeline<'a, S> {
    pub fn new(store: &'a S, embedder: &'a dyn EmbeddingProvider) -> Self {
        Self { store, embedder }
    }

    /// Embed, normalize and insert `records`.
    ///
    /// Every vector is checked before the store sees anything, so a failure leaves the
    /// collection untouched. Collections without `auto_id` get keys `0..n`.
    #[instrument(skip(self, handle, records), fields(collection = %handle.name, records = records.len()))]
    pub async fn ingest(
        &self,
        handle: &CollectionHandle,
        records: &[TextRecord],
    ) -> VectorResult<InsertReport> {
        if records.is_empty() {
            debug!("Nothing to ingest");
            return Ok(InsertReport::default());
        }

        let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != records.len() {
            return Err(VectorError::Embedding(format!(
                "provider returned {} embeddings for {} texts",
                embeddings.len(),
                records.len()
            )));
        }

        let documents = records
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (record, embedding))| {
                Ok(Document {
                    id: (!handle.auto_id).then_some(i as i64),
                    text: record.text.clone(),
                    vector: encode(&embedding.values, handle.embedding_dim)?,
                    subject: record.subject.clone(),
                })
            })
            .collect::<VectorResult<Vec<_>>>()?;

        let report = self.store.insert(&handle.name, documents).await?;
        info!(inserted = report.insert_count, "Records ingested");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{EmbeddingResult, MockEmbeddingProvider};
    use crate::models::RecordId;
    use crate::store::MockStoreClient;

    fn handle(dim: usize, auto_id: bool) -> CollectionHandle {
        CollectionHandle {
            name: "docs".to_string(),
            embedding_dim: dim,
            auto_id,
        }
    }

    fn records() -> Vec<TextRecord> {
        vec![
            TextRecord::new("Turing researched AI.", "ai"),
            TextRecord::new("AI was founded in 1956.", "ai"),
        ]
    }

    fn embedder_returning(vectors: Vec<Vec<f32>>) -> MockEmbeddingProvider {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed_batch().times(1).returning(move |_| {
            Ok(vectors
                .iter()
                .map(|v| EmbeddingResult {
                    values: v.clone(),
                    tokens_used: 1,
                })
                .collect())
        });
        embedder
    }

    #[tokio::test]
    async fn test_ingest_normalizes_and_inserts_once() {
        let embedder = embedder_returning(vec![vec![3.0, 4.0], vec![0.0, 2.0]]);
        let mut store = MockStoreClient::new();
        store
            .expect_insert()
            .withf(|name, docs| {
                name == "docs"
                    && docs.len() == 2
                    && docs.iter().all(|d| d.id.is_none() && d.subject == "ai")
                    && docs[0].vector.as_slice() == [0.6, 0.8]
                    && docs[1].vector.as_slice() == [0.0, 1.0]
            })
            .times(1)
            .returning(|_, docs| {
                Ok(InsertReport {
                    insert_count: docs.len(),
                    ids: vec![RecordId::Int(10), RecordId::Int(11)],
                })
            });

        let report = IngestionPipeline::new(&store, &embedder)
            .ingest(&handle(2, true), &records())
            .await
            .unwrap();
        assert_eq!(report.insert_count, 2);
    }

    #[tokio::test]
    async fn test_ingest_assigns_ids_without_auto_id() {
        let embedder = embedder_returning(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let mut store = MockStoreClient::new();
        store
            .expect_insert()
            .withf(|_, docs| docs[0].id == Some(0) && docs[1].id == Some(1))
            .times(1)
            .returning(|_, docs| {
                Ok(InsertReport {
                    insert_count: docs.len(),
                    ids: vec![RecordId::Int(0), RecordId::Int(1)],
                })
            });

        IngestionPipeline::new(&store, &embedder)
            .ingest(&handle(2, false), &records())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wrong_dimension_aborts_before_insert() {
        let embedder = embedder_returning(vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]]);
        let mut store = MockStoreClient::new();
        store.expect_insert().never();

        let err = IngestionPipeline::new(&store, &embedder)
            .ingest(&handle(2, true), &records())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VectorError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[tokio::test]
    async fn test_zero_vector_aborts_whole_batch() {
        let embedder = embedder_returning(vec![vec![1.0, 0.0], vec![0.0, 0.0]]);
        let mut store = MockStoreClient::new();
        store.expect_insert().never();

        let err = IngestionPipeline::new(&store, &embedder)
            .ingest(&handle(2, true), &records())
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::DegenerateEmbedding));
    }

    #[tokio::test]
    async fn test_embedding_count_mismatch() {
        let embedder = embedder_returning(vec![vec![1.0, 0.0]]);
        let mut store = MockStoreClient::new();
        store.expect_insert().never();

        let err = IngestionPipeline::new(&store, &embedder)
            .ingest(&handle(2, true), &records())
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_empty_records_skip_everything() {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed_batch().never();
        let mut store = MockStoreClient::new();
        store.expect_insert().never();

        let report = IngestionPipeline::new(&store, &embedder)
            .ingest(&handle(2, true), &[])
            .await
            .unwrap();
        assert_eq!(report, InsertReport::default());
    }

    #[tokio::test]
    async fn test_model_failure_aborts_before_insert() {
        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_embed_batch()
            .times(1)
            .returning(|_| Err(VectorError::Embedding("model not loaded".to_string())));
        let mut store = MockStoreClient::new();
        store.expect_insert().never();

        let err = IngestionPipeline::new(&store, &embedder)
            .ingest(&handle(2, true), &records())
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::Embedding(ref msg) if msg == "model not loaded"));
    }

    #[tokio::test]
    async fn test_insert_failure_is_store_unavailable() {
        let embedder = embedder_returning(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let mut store = MockStoreClient::new();
        store
            .expect_insert()
            .times(1)
            .returning(|_, _| Err(VectorError::StoreUnavailable("connection reset".to_string())));

        let err = IngestionPipeline::new(&store, &embedder)
            .ingest(&handle(2, true), &records())
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::StoreUnavailable(_)));
    }
}
