use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};

/// Field holding the embedding in every collection this crate creates.
pub const VECTOR_FIELD: &str = "vector";
/// Primary key field.
pub const ID_FIELD: &str = "id";
pub const TEXT_FIELD: &str = "text";
pub const SUBJECT_FIELD: &str = "subject";
/// Wildcard for "return every stored field".
pub const ALL_FIELDS: &str = "*";

/// A unit-length embedding ready for storage.
///
/// Only [`crate::codec::normalize`] builds these, so every value in circulation has an L2
/// norm of 1 within `f32` tolerance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    pub(crate) fn from_normalized(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl AsRef<[f32]> for EmbeddingVector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

/// Ingestion input: a piece of text and the subject it is filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRecord {
    pub text: String,
    pub subject: String,
}

impl TextRecord {
    pub fn new(text: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            subject: subject.into(),
        }
    }
}

/// A record as it is handed to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// `None` when the collection generates its own keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub text: String,
    pub vector: EmbeddingVector,
    pub subject: String,
}

impl Document {
    /// Scalar metadata stored next to the vector.
    pub fn payload(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(TEXT_FIELD.to_string(), Value::String(self.text.clone()));
        map.insert(SUBJECT_FIELD.to_string(), Value::String(self.subject.clone()));
        map
    }
}

/// Requested schema for a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSpec {
    pub name: String,
    pub embedding_dim: usize,
    /// Store generates primary keys when true.
    pub auto_id: bool,
}

impl CollectionSpec {
    pub fn new(name: impl Into<String>, embedding_dim: usize) -> Self {
        Self {
            name: name.into(),
            embedding_dim,
            auto_id: true,
        }
    }

    pub fn with_auto_id(mut self, auto_id: bool) -> Self {
        self.auto_id = auto_id;
        self
    }
}

/// Read-only reference to a collection that is known to exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionHandle {
    pub name: String,
    pub embedding_dim: usize,
    pub auto_id: bool,
}

impl From<&CollectionSpec> for CollectionHandle {
    fn from(spec: &CollectionSpec) -> Self {
        Self {
            name: spec.name.clone(),
            embedding_dim: spec.embedding_dim,
            auto_id: spec.auto_id,
        }
    }
}

/// Whether `ensure_collection` had to create the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    Created,
    Existing,
}

impl CollectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionStatus::Created => "created",
            CollectionStatus::Existing => "existing",
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, CollectionStatus::Created)
    }
}

/// Primary key as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    /// Interpret a JSON key; Milvus returns int64 keys as numbers or, for large values, strings.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(RecordId::Int),
            Value::String(s) => Some(
                s.parse::<i64>()
                    .map(RecordId::Int)
                    .unwrap_or_else(|_| RecordId::Text(s.clone())),
            ),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            RecordId::Int(i) => Value::from(*i),
            RecordId::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(i) => write!(f, "{i}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

/// Store acknowledgement for a batch insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InsertReport {
    pub insert_count: usize,
    pub ids: Vec<RecordId>,
}

/// Read consistency for a search, named after the Milvus levels.
///
/// Parsing accepts any casing ("eventually", "Eventually").
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum ConsistencyLevel {
    /// Reads observe every acknowledged write.
    Strong,
    /// Reads observe the writes of the same client session.
    Session,
    /// Reads may lag writes by a bounded staleness window.
    #[default]
    Bounded,
    /// Reads may observe any earlier state.
    Eventually,
}

/// A single similarity search submitted to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub vectors: Vec<EmbeddingVector>,
    pub top_k: usize,
    pub output_fields: Vec<String>,
    pub consistency: ConsistencyLevel,
}

impl SearchRequest {
    /// One query vector, every field requested.
    pub fn single(vector: EmbeddingVector, top_k: usize, consistency: ConsistencyLevel) -> Self {
        Self {
            vectors: vec![vector],
            top_k,
            output_fields: vec![ALL_FIELDS.to_string()],
            consistency,
        }
    }

    pub fn wants_vectors(&self) -> bool {
        self.output_fields
            .iter()
            .any(|f| f == ALL_FIELDS || f == VECTOR_FIELD)
    }
}

/// One hit of a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub id: RecordId,
    /// Cosine similarity as reported by the store; higher is closer.
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<Map<String, Value>>,
}

impl QueryResult {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.entity.as_ref().and_then(|e| e.get(name))
    }

    pub fn text(&self) -> Option<&str> {
        self.field(TEXT_FIELD).and_then(Value::as_str)
    }

    pub fn subject(&self) -> Option<&str> {
        self.field(SUBJECT_FIELD).and_then(Value::as_str)
    }

    pub fn has_vector(&self) -> bool {
        self.field(VECTOR_FIELD).is_some()
    }

    /// Drop the raw embedding from the entity, keeping every other field.
    pub fn without_vector(mut self) -> Self {
        if let Some(entity) = self.entity.as_mut() {
            entity.remove(VECTOR_FIELD);
        }
        self
    }
}
