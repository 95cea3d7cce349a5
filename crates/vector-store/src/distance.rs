//! Vector distance metrics shared by every search strategy.

use crate::error::{Result, VectorStoreError};

/// Euclidean (L2) distance between two vectors of equal length.
pub fn euclidean(a: &[f32], b: &[f32]) -> Result<f32> {
    VectorStoreError::check_lengths(a.len(), b.len())?;

    let sum: f32 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum();

    Ok(sum.sqrt())
}

/// Cosine similarity between two vectors of equal length.
///
/// Returns a value in `[-1, 1]` for non-zero vectors and exactly `0.0` when either
/// vector has zero magnitude.
pub fn cosine(a: &[f32], b: &[f32]) -> Result<f32> {
    VectorStoreError::check_lengths(a.len(), b.len())?;

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    // Rounding can push parallel vectors a hair past 1.
    Ok((dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0))
}
