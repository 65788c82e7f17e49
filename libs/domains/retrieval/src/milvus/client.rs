use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use super::MilvusConfig;
use crate::error::{VectorError, VectorResult};
use crate::models::{
    CollectionSpec, Document, ID_FIELD, InsertReport, QueryResult, RecordId, SearchRequest,
    VECTOR_FIELD,
};
use crate::store::{StoreBackend, StoreClient};

/// Field Milvus adds to every search hit.
const DISTANCE_FIELD: &str = "distance";

/// Milvus client over the REST v2 API (`/v2/vectordb/...`)
pub struct MilvusStore {
    client: Client,
    config: MilvusConfig,
}

/// `{code, message, data}` wrapper around every REST v2 reply.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct HasData {
    has: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertData {
    insert_count: usize,
    #[serde(default)]
    insert_ids: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct SearchReply {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Vec<Map<String, Value>>,
    /// Hits per query vector; absent for single-vector searches on older servers.
    #[serde(default)]
    topks: Option<Vec<usize>>,
}

impl MilvusStore {
    pub fn new(config: MilvusConfig) -> VectorResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VectorError::store("Failed to build Milvus HTTP client", e))?;

        Ok(Self { client, config })
    }

    /// Build the client and verify the server answers.
    pub async fn connect(config: MilvusConfig) -> VectorResult<Self> {
        let store = Self::new(config)?;
        let collections = store.list_collections().await?;
        info!(
            uri = %store.config.uri,
            collections = ?collections,
            "Connected to Milvus"
        );
        Ok(store)
    }

    pub fn config(&self) -> &MilvusConfig {
        &self.config
    }

    /// Adds `dbName` when configured.
    fn body(&self, mut body: Value) -> Value {
        if let (Some(db), Value::Object(map)) = (&self.config.db_name, &mut body) {
            map.insert("dbName".to_string(), Value::String(db.clone()));
        }
        body
    }

    async fn post_raw<T: DeserializeOwned>(&self, path: &str, body: Value) -> VectorResult<T> {
        let url = self.config.endpoint(path);
        debug!(%url, "Milvus request");

        let mut builder = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(&self.body(body));
        if let Some(token) = &self.config.token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| VectorError::store(path, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VectorError::StoreUnavailable(format!(
                "{path}: HTTP {status}: {error_text}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| VectorError::store(&format!("{path}: malformed response"), e))
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> VectorResult<Option<T>> {
        let envelope: Envelope<T> = self.post_raw(path, body).await?;
        check_code(path, envelope.code, envelope.message.as_deref())?;
        Ok(envelope.data)
    }
}

fn check_code(path: &str, code: i64, message: Option<&str>) -> VectorResult<()> {
    if code == 0 {
        return Ok(());
    }
    Err(VectorError::StoreUnavailable(format!(
        "{path}: Milvus error {code}: {}",
        message.unwrap_or("no message")
    )))
}

fn document_row(document: Document) -> Value {
    let mut row = document.payload();
    if let Some(id) = document.id {
        row.insert(ID_FIELD.to_string(), Value::from(id));
    }
    row.insert(
        VECTOR_FIELD.to_string(),
        Value::from(document.vector.into_inner()),
    );
    Value::Object(row)
}

/// Turn one flat search row into a hit; the row minus `distance` is the entity.
fn hit_from_row(mut row: Map<String, Value>) -> VectorResult<QueryResult> {
    let score = row
        .remove(DISTANCE_FIELD)
        .and_then(|d| d.as_f64())
        .ok_or_else(|| {
            VectorError::StoreUnavailable("search hit without a distance".to_string())
        })? as f32;
    let id = row
        .get(ID_FIELD)
        .and_then(RecordId::from_json)
        .ok_or_else(|| VectorError::StoreUnavailable("search hit without an id".to_string()))?;

    Ok(QueryResult {
        id,
        score,
        entity: Some(row),
    })
}

/// Split the flat hit list into one group per query vector.
fn group_hits(reply: SearchReply, queries: usize) -> VectorResult<Vec<Vec<QueryResult>>> {
    let hits = reply
        .data
        .into_iter()
        .map(hit_from_row)
        .collect::<VectorResult<Vec<_>>>()?;

    let topks = match reply.topks {
        Some(topks) => topks,
        None if queries <= 1 => vec![hits.len()],
        None => {
            return Err(VectorError::StoreUnavailable(
                "multi-vector search reply without topks".to_string(),
            ));
        }
    };

    if topks.iter().sum::<usize>() != hits.len() {
        return Err(VectorError::StoreUnavailable(format!(
            "search reply topks {:?} do not match {} hits",
            topks,
            hits.len()
        )));
    }

    let mut remaining = hits.into_iter();
    Ok(topks
        .into_iter()
        .map(|k| remaining.by_ref().take(k).collect())
        .collect())
}

#[async_trait]
impl StoreClient for MilvusStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Milvus
    }

    async fn has_collection(&self, name: &str) -> VectorResult<bool> {
        let data: Option<HasData> = self
            .post("collections/has", json!({ "collectionName": name }))
            .await?;
        data.map(|d| d.has).ok_or_else(|| {
            VectorError::StoreUnavailable("collections/has: reply without data".to_string())
        })
    }

    async fn create_collection(&self, spec: &CollectionSpec) -> VectorResult<()> {
        let _: Option<Value> = self
            .post(
                "collections/create",
                json!({
                    "collectionName": spec.name,
                    "dimension": spec.embedding_dim,
                    "metricType": "COSINE",
                    "idType": "Int64",
                    "autoId": spec.auto_id,
                    "primaryFieldName": ID_FIELD,
                    "vectorFieldName": VECTOR_FIELD,
                }),
            )
            .await?;
        Ok(())
    }

    async fn list_collections(&self) -> VectorResult<Vec<String>> {
        let data: Option<Vec<String>> = self.post("collections/list", json!({})).await?;
        Ok(data.unwrap_or_default())
    }

    async fn insert(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> VectorResult<InsertReport> {
        let rows: Vec<Value> = documents.into_iter().map(document_row).collect();
        let data: Option<InsertData> = self
            .post(
                "entities/insert",
                json!({ "collectionName": collection, "data": rows }),
            )
            .await?;
        let data = data.ok_or_else(|| {
            VectorError::StoreUnavailable("entities/insert: reply without data".to_string())
        })?;

        Ok(InsertReport {
            insert_count: data.insert_count,
            ids: data.insert_ids.iter().filter_map(RecordId::from_json).collect(),
        })
    }

    async fn search(
        &self,
        collection: &str,
        request: SearchRequest,
    ) -> VectorResult<Vec<Vec<QueryResult>>> {
        let queries = request.vectors.len();
        let vectors: Vec<Vec<f32>> = request
            .vectors
            .into_iter()
            .map(|v| v.into_inner())
            .collect();

        let reply: SearchReply = self
            .post_raw(
                "entities/search",
                json!({
                    "collectionName": collection,
                    "data": vectors,
                    "annsField": VECTOR_FIELD,
                    "limit": request.top_k,
                    "outputFields": request.output_fields,
                    "consistencyLevel": request.consistency.as_ref(),
                }),
            )
            .await?;
        check_code("entities/search", reply.code, reply.message.as_deref())?;

        group_hits(reply, queries)
    }
}
