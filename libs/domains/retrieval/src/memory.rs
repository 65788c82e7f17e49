//! In-process store with brute-force cosine search.
//!
//! Stands in for a real server in tests and offline runs. Writes are visible to the next
//! search regardless of the requested consistency level.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::codec::cosine_similarity;
use crate::error::{VectorError, VectorResult};
use crate::models::{
    CollectionSpec, Document, EmbeddingVector, ID_FIELD, InsertReport, QueryResult, RecordId,
    SUBJECT_FIELD, SearchRequest, TEXT_FIELD, VECTOR_FIELD,
};
use crate::store::{StoreBackend, StoreClient};

#[derive(Debug)]
struct StoredEntity {
    id: i64,
    vector: EmbeddingVector,
    text: String,
    subject: String,
}

#[derive(Debug)]
struct MemoryCollection {
    spec: CollectionSpec,
    next_id: i64,
    entities: Vec<StoredEntity>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, MemoryCollection>>,
    create_calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `create_collection` calls received, including rejected ones.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub async fn entity_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.entities.len())
            .unwrap_or(0)
    }
}

fn missing(collection: &str) -> VectorError {
    VectorError::StoreUnavailable(format!("collection '{collection}' does not exist"))
}

fn check_dimension(spec: &CollectionSpec, vector: &EmbeddingVector) -> VectorResult<()> {
    if vector.dimension() != spec.embedding_dim {
        return Err(VectorError::StoreUnavailable(format!(
            "collection '{}' has dimension {}, got {}",
            spec.name,
            spec.embedding_dim,
            vector.dimension()
        )));
    }
    Ok(())
}

#[async_trait]
impl StoreClient for InMemoryStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Memory
    }

    async fn has_collection(&self, name: &str) -> VectorResult<bool> {
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn create_collection(&self, spec: &CollectionSpec) -> VectorResult<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut collections = self.collections.write().await;
        if collections.contains_key(&spec.name) {
            return Err(VectorError::StoreUnavailable(format!(
                "collection '{}' already exists",
                spec.name
            )));
        }
        collections.insert(
            spec.name.clone(),
            MemoryCollection {
                spec: spec.clone(),
                next_id: 1,
                entities: Vec::new(),
            },
        );
        Ok(())
    }

    async fn list_collections(&self) -> VectorResult<Vec<String>> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn insert(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> VectorResult<InsertReport> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| missing(collection))?;

        // All-or-nothing, like a single store call.
        for document in &documents {
            check_dimension(&target.spec, &document.vector)?;
            if target.spec.auto_id != document.id.is_none() {
                return Err(VectorError::StoreUnavailable(format!(
                    "collection '{collection}' auto_id={} does not match supplied keys",
                    target.spec.auto_id
                )));
            }
        }

        let mut ids = Vec::with_capacity(documents.len());
        for document in documents {
            let id = match document.id {
                Some(id) => id,
                None => {
                    let id = target.next_id;
                    target.next_id += 1;
                    id
                }
            };
            target.entities.push(StoredEntity {
                id,
                vector: document.vector,
                text: document.text,
                subject: document.subject,
            });
            ids.push(RecordId::Int(id));
        }

        Ok(InsertReport {
            insert_count: ids.len(),
            ids,
        })
    }

    async fn search(
        &self,
        collection: &str,
        request: SearchRequest,
    ) -> VectorResult<Vec<Vec<QueryResult>>> {
        let collections = self.collections.read().await;
        let target = collections.get(collection).ok_or_else(|| missing(collection))?;
        let with_vectors = request.wants_vectors();

        request
            .vectors
            .iter()
            .map(|query| {
                check_dimension(&target.spec, query)?;

                let mut scored: Vec<(f32, &StoredEntity)> = target
                    .entities
                    .iter()
                    .map(|entity| (cosine_similarity(query, &entity.vector), entity))
                    .collect();
                scored.sort_by(|a, b| b.0.total_cmp(&a.0));

                Ok(scored
                    .into_iter()
                    .take(request.top_k)
                    .map(|(score, entity)| {
                        let mut fields = Map::new();
                        fields.insert(ID_FIELD.to_string(), Value::from(entity.id));
                        fields.insert(TEXT_FIELD.to_string(), Value::from(entity.text.clone()));
                        fields.insert(
                            SUBJECT_FIELD.to_string(),
                            Value::from(entity.subject.clone()),
                        );
                        if with_vectors {
                            fields.insert(
                                VECTOR_FIELD.to_string(),
                                Value::from(entity.vector.as_slice().to_vec()),
                            );
                        }
                        QueryResult {
                            id: RecordId::Int(entity.id),
                            score,
                            entity: Some(fields),
                        }
                    })
                    .collect())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::normalize;
    use crate::models::ConsistencyLevel;

    fn doc(text: &str, raw: &[f32]) -> Document {
        Document {
            id: None,
            text: text.to_string(),
            vector: normalize(raw).unwrap(),
            subject: "ai".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_twice_is_rejected_but_counted() {
        let store = InMemoryStore::new();
        let spec = CollectionSpec::new("docs", 2);
        store.create_collection(&spec).await.unwrap();
        assert!(store.create_collection(&spec).await.is_err());
        assert_eq!(store.create_calls(), 2);
        assert_eq!(store.list_collections().await.unwrap(), vec!["docs"]);
    }

    #[tokio::test]
    async fn test_insert_and_search_ranked() {
        let store = InMemoryStore::new();
        store
            .create_collection(&CollectionSpec::new("docs", 2))
            .await
            .unwrap();
        let report = store
            .insert("docs", vec![doc("east", &[1.0, 0.0]), doc("north", &[0.0, 1.0])])
            .await
            .unwrap();
        assert_eq!(report.insert_count, 2);
        assert_eq!(report.ids, vec![RecordId::Int(1), RecordId::Int(2)]);

        let request = SearchRequest::single(
            normalize(&[0.1, 1.0]).unwrap(),
            5,
            ConsistencyLevel::Eventually,
        );
        let groups = store.search("docs", request).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0][0].text(), Some("north"));
        assert!(groups[0][0].score >= groups[0][1].score);
        assert!(groups[0][0].has_vector());
    }

    #[tokio::test]
    async fn test_dimension_rejected_by_store() {
        let store = InMemoryStore::new();
        store
            .create_collection(&CollectionSpec::new("docs", 3))
            .await
            .unwrap();
        let err = store
            .insert("docs", vec![doc("short", &[1.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::StoreUnavailable(_)));
        assert_eq!(store.entity_count("docs").await, 0);
    }

    #[tokio::test]
    async fn test_missing_collection() {
        let store = InMemoryStore::new();
        assert!(!store.has_collection("nope").await.unwrap());
        let err = store.insert("nope", vec![]).await.unwrap_err();
        assert!(matches!(err, VectorError::StoreUnavailable(_)));
    }
}
