//! Feature-hashing embedder.
//!
//! Each lowercase alphanumeric token lands in one signed bucket, so texts sharing words point in
//! similar directions. Good enough to exercise a store end to end without a model server.

use async_trait::async_trait;

use super::{EmbeddingProvider, EmbeddingProviderType, EmbeddingResult};
use crate::error::{VectorError, VectorResult};

pub const DEFAULT_HASHING_DIM: usize = 384;

#[derive(Debug, Clone)]
pub struct HashingProvider {
    dimension: usize,
}

impl HashingProvider {
    pub fn new(dimension: usize) -> VectorResult<Self> {
        if dimension == 0 {
            return Err(VectorError::Config(
                "hashing embedder dimension must be > 0".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    /// Raw bucket counts. Text without tokens maps to the zero vector.
    pub fn embed_raw(&self, text: &str) -> (Vec<f32>, u32) {
        let mut values = vec![0.0f32; self.dimension];
        let mut tokens = 0u32;
        for token in tokenize(text) {
            let hash = fnv1a_64(token.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            values[bucket] += sign;
            tokens += 1;
        }
        (values, tokens)
    }
}

impl Default for HashingProvider {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_HASHING_DIM,
        }
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[async_trait]
impl EmbeddingProvider for HashingProvider {
    fn provider_type(&self) -> EmbeddingProviderType {
        EmbeddingProviderType::Hashing
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> VectorResult<EmbeddingResult> {
        let (values, tokens_used) = self.embed_raw(text);
        Ok(EmbeddingResult {
            values,
            tokens_used,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> VectorResult<Vec<EmbeddingResult>> {
        Ok(texts
            .iter()
            .map(|text| {
                let (values, tokens_used) = self.embed_raw(text);
                EmbeddingResult {
                    values,
                    tokens_used,
                }
            })
            .collect())
    }
}
