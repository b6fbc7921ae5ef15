//! Numeric primitives over embedding vectors.
//!
//! All functions work on plain `f32` slices so they can be fed straight from
//! [`Embedding::as_slice`](crate::Embedding::as_slice). Accumulation happens in
//! `f64` and the final value is narrowed back to `f32`, which keeps
//! `cosine_similarity(a, a)` at exactly `1.0` for typical embedding sizes.

use crate::error::{MatchError, MatchResult};

/// Chunk size for the accumulation loops; keeps the inner loop friendly to
/// auto-vectorization.
const CHUNK_SIZE: usize = 32;

/// Dot product of two equal-length vectors.
pub fn dot(a: &[f32], b: &[f32]) -> MatchResult<f32> {
    ensure_same_dimension(a, b)?;
    Ok(dot_unchecked(a, b) as f32)
}

/// Euclidean norm. An all-zero (or empty) vector has magnitude `0.0`.
pub fn magnitude(v: &[f32]) -> f32 {
    squared_norm(v).sqrt() as f32
}

/// Cosine similarity in `[-1.0, 1.0]`.
///
/// If either vector has zero magnitude the similarity is defined as `0.0`,
/// including when both are zero vectors. Non-finite components also yield
/// `0.0`, so the result is never NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> MatchResult<f32> {
    ensure_same_dimension(a, b)?;

    let norm_a = squared_norm(a);
    let norm_b = squared_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    let cosine = dot_unchecked(a, b) / (norm_a.sqrt() * norm_b.sqrt());
    if !cosine.is_finite() {
        return Ok(0.0);
    }
    // `+ 0.0` folds a negative zero from orthogonal vectors into `0.0`.
    Ok(cosine.clamp(-1.0, 1.0) as f32 + 0.0)
}

fn ensure_same_dimension(a: &[f32], b: &[f32]) -> MatchResult<()> {
    if a.len() != b.len() {
        return Err(MatchError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

#[inline]
fn dot_unchecked(a: &[f32], b: &[f32]) -> f64 {
    a.chunks(CHUNK_SIZE)
        .zip(b.chunks(CHUNK_SIZE))
        .map(|(ca, cb)| {
            ca.iter()
                .zip(cb)
                .map(|(&x, &y)| f64::from(x) * f64::from(y))
                .sum::<f64>()
        })
        .sum()
}

#[inline]
fn squared_norm(v: &[f32]) -> f64 {
    v.chunks(CHUNK_SIZE)
        .map(|c| c.iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>())
        .sum()
}
