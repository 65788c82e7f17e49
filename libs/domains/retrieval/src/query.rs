use tracing::{info, instrument};

use crate::codec::encode;
use crate::embedding::EmbeddingProvider;
use crate::error::{VectorError, VectorResult};
use crate::models::{CollectionHandle, ConsistencyLevel, QueryResult, SearchRequest};
use crate::store::StoreClient;

/// Answers a text query with the nearest stored entries.
pub struct QueryPipeline<'a, S: ?Sized> {
    store: &'a S,
    embedder: &'a dyn EmbeddingProvider,
}

impl<'a, S: StoreClient + ?Sized> QueryPipeline<'a, S> {
    pub fn new(store: &'a S, embedder: &'a dyn EmbeddingProvider) -> Self {
        Self { store, embedder }
    }

    /// Top `top_k` hits for `text`, in store order, with the raw `vector` field removed.
    #[instrument(skip(self, handle, text), fields(collection = %handle.name))]
    pub async fn query(
        &self,
        handle: &CollectionHandle,
        text: &str,
        top_k: usize,
        consistency: ConsistencyLevel,
    ) -> VectorResult<Vec<QueryResult>> {
        if top_k == 0 {
            return Err(VectorError::Validation("top_k must be > 0".to_string()));
        }
        if text.trim().is_empty() {
            return Err(VectorError::Validation(
                "query text must not be blank".to_string(),
            ));
        }

        let embedding = self.embedder.embed(text).await?;
        let vector = encode(&embedding.values, handle.embedding_dim)?;

        let groups = self
            .store
            .search(
                &handle.name,
                SearchRequest::single(vector, top_k, consistency),
            )
            .await?;

        let results: Vec<QueryResult> = groups
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(QueryResult::without_vector)
            .collect();

        info!(hits = results.len(), "Query answered");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{EmbeddingResult, MockEmbeddingProvider};
    use crate::models::{ALL_FIELDS, RecordId};
    use crate::store::MockStoreClient;
    use serde_json::{Map, json};

    fn handle() -> CollectionHandle {
        CollectionHandle {
            name: "docs".to_string(),
            embedding_dim: 2,
            auto_id: true,
        }
    }

    fn embedder(values: Vec<f32>) -> MockEmbeddingProvider {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed().returning(move |_| {
            Ok(EmbeddingResult {
                values: values.clone(),
                tokens_used: 1,
            })
        });
        embedder
    }

    fn hit(id: i64, score: f32, text: &str) -> QueryResult {
        let mut entity = Map::new();
        entity.insert("id".into(), json!(id));
        entity.insert("text".into(), json!(text));
        entity.insert("subject".into(), json!("ai"));
        entity.insert("vector".into(), json!([0.6, 0.8]));
        QueryResult {
            id: RecordId::Int(id),
            score,
            entity: Some(entity),
        }
    }

    #[tokio::test]
    async fn test_query_sends_normalized_wildcard_search() {
        let embedder = embedder(vec![0.0, 5.0]);
        let mut store = MockStoreClient::new();
        store
            .expect_search()
            .withf(|name, request| {
                name == "docs"
                    && request.vectors.len() == 1
                    && request.vectors[0].as_slice() == [0.0, 1.0]
                    && request.top_k == 2
                    && request.output_fields == vec![ALL_FIELDS.to_string()]
                    && request.consistency == ConsistencyLevel::Eventually
            })
            .times(1)
            .returning(|_, _| Ok(vec![vec![hit(1, 0.9, "a"), hit(2, 0.4, "b")]]));

        let results = QueryPipeline::new(&store, &embedder)
            .query(&handle(), "Who was Turing?", 2, ConsistencyLevel::Eventually)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, RecordId::Int(1));
        assert_eq!(results[1].text(), Some("b"));
        assert!(results.iter().all(|r| !r.has_vector()));
        assert!(results.iter().all(|r| r.subject() == Some("ai")));
    }

    #[tokio::test]
    async fn test_store_order_is_kept() {
        let embedder = embedder(vec![1.0, 0.0]);
        let mut store = MockStoreClient::new();
        store
            .expect_search()
            .returning(|_, _| Ok(vec![vec![hit(2, 0.1, "low"), hit(1, 0.9, "high")]]));

        let results = QueryPipeline::new(&store, &embedder)
            .query(&handle(), "q", 5, ConsistencyLevel::Strong)
            .await
            .unwrap();
        assert_eq!(results[0].text(), Some("low"));
    }

    #[tokio::test]
    async fn test_empty_reply_is_empty_result() {
        let embedder = embedder(vec![1.0, 0.0]);
        let mut store = MockStoreClient::new();
        store.expect_search().returning(|_, _| Ok(vec![]));

        let results = QueryPipeline::new(&store, &embedder)
            .query(&handle(), "q", 5, ConsistencyLevel::Bounded)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_input_makes_no_calls() {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed().never();
        let mut store = MockStoreClient::new();
        store.expect_search().never();
        let pipeline = QueryPipeline::new(&store, &embedder);

        let err = pipeline
            .query(&handle(), "q", 0, ConsistencyLevel::Eventually)
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::Validation(_)));

        let err = pipeline
            .query(&handle(), "   ", 2, ConsistencyLevel::Eventually)
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::Validation(_)));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_before_search() {
        let embedder = embedder(vec![1.0, 0.0, 0.0]);
        let mut store = MockStoreClient::new();
        store.expect_search().never();

        let err = QueryPipeline::new(&store, &embedder)
            .query(&handle(), "q", 2, ConsistencyLevel::Eventually)
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
    async fn test_embed_failure_skips_search() {
        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_embed()
            .times(1)
            .returning(|_| Err(VectorError::Embedding("model not loaded".to_string())));
        let mut store = MockStoreClient::new();
        store.expect_search().never();

        let err = QueryPipeline::new(&store, &embedder)
            .query(&handle(), "q", 2, ConsistencyLevel::Eventually)
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_search_failure_is_store_unavailable() {
        let embedder = embedder(vec![1.0, 0.0]);
        let mut store = MockStoreClient::new();
        store
            .expect_search()
            .times(1)
            .returning(|_, _| Err(VectorError::StoreUnavailable("timed out".to_string())));

        let err = QueryPipeline::new(&store, &embedder)
            .query(&handle(), "q", 2, ConsistencyLevel::Eventually)
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::StoreUnavailable(_)));
    }
}
