use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    self, CreateCollectionBuilder, Distance, PointId, PointStruct, ReadConsistencyType,
    SearchPoints, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
    VectorParamsBuilder,
};
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use super::QdrantConfig;
use crate::error::{VectorError, VectorResult};
use crate::models::{
    CollectionSpec, ConsistencyLevel, Document, ID_FIELD, InsertReport, QueryResult, RecordId,
    SearchRequest, VECTOR_FIELD,
};
use crate::store::{StoreBackend, StoreClient};

/// Qdrant-backed implementation of StoreClient
pub struct QdrantStore {
    client: Qdrant,
}

impl QdrantStore {
    pub fn new(config: QdrantConfig) -> VectorResult<Self> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(api_key) = config.api_key {
            builder = builder.api_key(api_key);
        }

        builder = builder.timeout(Duration::from_secs(config.timeout_secs));

        let client = builder
            .build()
            .map_err(|e| VectorError::store("Failed to build Qdrant client", e))?;

        Ok(Self { client })
    }

    /// Build the client and verify the server answers.
    pub async fn connect(config: QdrantConfig) -> VectorResult<Self> {
        let url = config.url.clone();
        let store = Self::new(config)?;
        let collections = store.list_collections().await?;
        info!(%url, collections = ?collections, "Connected to Qdrant");
        Ok(store)
    }

    pub fn from_client(client: Qdrant) -> Self {
        Self { client }
    }
}

/// Qdrant has no session or staleness bound; `Eventually` keeps the server default.
fn read_consistency(level: ConsistencyLevel) -> Option<qdrant::read_consistency::Value> {
    let kind = match level {
        ConsistencyLevel::Strong => ReadConsistencyType::All,
        ConsistencyLevel::Session | ConsistencyLevel::Bounded => ReadConsistencyType::Majority,
        ConsistencyLevel::Eventually => return None,
    };
    Some(qdrant::read_consistency::Value::Type(kind as i32))
}

fn search_points(
    collection: &str,
    vector: Vec<f32>,
    top_k: usize,
    with_vectors: bool,
    consistency: ConsistencyLevel,
) -> SearchPoints {
    let mut builder = SearchPointsBuilder::new(collection, vector, top_k as u64)
        .with_payload(true)
        .with_vectors(with_vectors);
    if let Some(value) = read_consistency(consistency) {
        builder = builder.read_consistency(value);
    }
    builder.build()
}

/// Auto ids become random UUIDs; explicit ids must be non-negative.
fn point_id(id: Option<i64>) -> VectorResult<(PointId, RecordId)> {
    match id {
        None => {
            let uuid = Uuid::new_v4().to_string();
            Ok((PointId::from(uuid.clone()), RecordId::Text(uuid)))
        }
        Some(id) => {
            let num = u64::try_from(id).map_err(|_| {
                VectorError::Validation(format!("Qdrant point ids must be non-negative, got {id}"))
            })?;
            Ok((PointId::from(num), RecordId::Int(id)))
        }
    }
}

fn record_id(point_id: &PointId) -> VectorResult<RecordId> {
    match &point_id.point_id_options {
        Some(qdrant::point_id::PointIdOptions::Uuid(uuid)) => Ok(RecordId::Text(uuid.clone())),
        Some(qdrant::point_id::PointIdOptions::Num(num)) => i64::try_from(*num)
            .map(RecordId::Int)
            .map_err(|_| VectorError::StoreUnavailable(format!("point id {num} exceeds i64"))),
        None => Err(VectorError::StoreUnavailable(
            "Missing point ID".to_string(),
        )),
    }
}

fn payload_to_qdrant(payload: Map<String, Value>) -> HashMap<String, QdrantValue> {
    payload
        .into_iter()
        .filter_map(|(key, val)| json_to_qdrant_value(val).map(|v| (key, v)))
        .collect()
}

fn qdrant_to_payload(payload: HashMap<String, QdrantValue>) -> Map<String, Value> {
    payload
        .into_iter()
        .filter_map(|(key, val)| qdrant_value_to_json(val).map(|v| (key, v)))
        .collect()
}

fn json_to_qdrant_value(val: Value) -> Option<QdrantValue> {
    match val {
        Value::Null => None,
        Value::Bool(b) => Some(QdrantValue::from(b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(QdrantValue::from(i))
            } else {
                n.as_f64().map(QdrantValue::from)
            }
        }
        Value::String(s) => Some(QdrantValue::from(s)),
        _ => Some(QdrantValue::from(val.to_string())),
    }
}

fn qdrant_value_to_json(val: QdrantValue) -> Option<Value> {
    use qdrant::value::Kind;

    match val.kind {
        Some(Kind::NullValue(_)) => Some(Value::Null),
        Some(Kind::BoolValue(b)) => Some(Value::Bool(b)),
        Some(Kind::IntegerValue(i)) => Some(Value::Number(i.into())),
        Some(Kind::DoubleValue(f)) => serde_json::Number::from_f64(f).map(Value::Number),
        Some(Kind::StringValue(s)) => Some(Value::String(s)),
        _ => None,
    }
}

/// Dense vector of a hit, when vectors were requested.
#[allow(deprecated)]
fn extract_vector(vectors: &Option<qdrant::VectorsOutput>) -> Option<Vec<f32>> {
    match vectors {
        Some(qdrant::VectorsOutput {
            vectors_options: Some(opts),
        }) => match opts {
            qdrant::vectors_output::VectorsOptions::Vector(v) => Some(v.data.clone()),
            qdrant::vectors_output::VectorsOptions::Vectors(map) => {
                map.vectors.values().next().map(|v| v.data.clone())
            }
        },
        _ => None,
    }
}

fn hit_from_point(point: qdrant::ScoredPoint) -> VectorResult<QueryResult> {
    let id = point
        .id
        .as_ref()
        .map(record_id)
        .transpose()?
        .ok_or_else(|| VectorError::StoreUnavailable("Missing point ID".to_string()))?;

    let mut entity = qdrant_to_payload(point.payload);
    entity.insert(ID_FIELD.to_string(), id.to_json());
    if let Some(vector) = extract_vector(&point.vectors) {
        entity.insert(VECTOR_FIELD.to_string(), Value::from(vector));
    }

    Ok(QueryResult {
        id,
        score: point.score,
        entity: Some(entity),
    })
}

#[async_trait]
impl StoreClient for QdrantStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Qdrant
    }

    async fn has_collection(&self, name: &str) -> VectorResult<bool> {
        Ok(self.list_collections().await?.iter().any(|c| c == name))
    }

    async fn create_collection(&self, spec: &CollectionSpec) -> VectorResult<()> {
        let builder = CreateCollectionBuilder::new(&spec.name).vectors_config(
            VectorParamsBuilder::new(spec.embedding_dim as u64, Distance::Cosine),
        );
        self.client.create_collection(builder).await?;
        Ok(())
    }

    async fn list_collections(&self) -> VectorResult<Vec<String>> {
        let response = self.client.list_collections().await?;
        Ok(response
            .collections
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    async fn insert(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> VectorResult<InsertReport> {
        let mut ids = Vec::with_capacity(documents.len());
        let mut points = Vec::with_capacity(documents.len());

        for document in documents {
            let (point, record) = point_id(document.id)?;
            let payload = payload_to_qdrant(document.payload());
            points.push(PointStruct::new(point, document.vector.into_inner(), payload));
            ids.push(record);
        }

        // Search right after ingest must see the batch.
        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await?;

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
        let with_vectors = request.wants_vectors();
        let mut groups = Vec::with_capacity(request.vectors.len());

        for vector in request.vectors {
            let points = search_points(
                collection,
                vector.into_inner(),
                request.top_k,
                with_vectors,
                request.consistency,
            );
            let response = self.client.search_points(points).await?;
            groups.push(
                response
                    .result
                    .into_iter()
                    .map(hit_from_point)
                    .collect::<VectorResult<Vec<_>>>()?,
            );
        }

        Ok(groups)
    }
}
