//! Vector codec: raw model output to unit-length `f32` storage vectors.
//!
//! Ingestion and query both go through [`normalize`]; comparing unit vectors by inner product
//! is cosine similarity only when both sides used the same rule.

use crate::error::{VectorError, VectorResult};
use crate::models::EmbeddingVector;

/// Normalize a raw embedding to unit L2 norm.
///
/// The norm is accumulated in `f64`. A zero, non-finite or empty input fails with
/// [`VectorError::DegenerateEmbedding`] instead of dividing through.
pub fn normalize(raw: &[f32]) -> VectorResult<EmbeddingVector> {
    let norm = l2_norm(raw);
    if raw.is_empty() || norm == 0.0 || !norm.is_finite() {
        return Err(VectorError::DegenerateEmbedding);
    }

    let out: Vec<f32> = raw.iter().map(|&v| (f64::from(v) / norm) as f32).collect();
    if out.iter().any(|v| !v.is_finite()) {
        return Err(VectorError::DegenerateEmbedding);
    }
    Ok(EmbeddingVector::from_normalized(out))
}

/// Check a raw vector against the collection dimension, then [`normalize`] it.
///
/// Ingestion and query share this so both sides of a similarity comparison are encoded alike.
pub fn encode(raw: &[f32], expected_dim: usize) -> VectorResult<EmbeddingVector> {
    if raw.len() != expected_dim {
        return Err(VectorError::DimensionMismatch {
            expected: expected_dim,
            actual: raw.len(),
        });
    }
    normalize(raw)
}

/// L2 norm in `f64`.
pub fn l2_norm(values: &[f32]) -> f64 {
    values
        .iter()
        .map(|&v| f64::from(v) * f64::from(v))
        .sum::<f64>()
        .sqrt()
}

/// Cosine similarity of two unit vectors (their inner product).
///
/// Vectors of different length score 0.
pub fn cosine_similarity(a: &EmbeddingVector, b: &EmbeddingVector) -> f32 {
    if a.dimension() != b.dimension() {
        return 0.0;
    }
    a.as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(x, y)| x * y)
        .sum()
}
