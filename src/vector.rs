//! Dense vector math used by the grouper.
//!
//! Everything here is a pure function over `f32` slices. Zero-magnitude inputs are
//! handled explicitly: similarities against them are `0.0` and normalizing them leaves
//! them at zero, so no NaN ever leaks into cluster state.

use crate::error::{Error, Result};

/// Dot product of two equally sized vectors.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Euclidean (L2) magnitude.
#[inline]
pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity in `[-1, 1]`.
///
/// Returns `0.0` when either vector has zero magnitude.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have the same length");

    let mut ab = 0.0f32;
    let mut aa = 0.0f32;
    let mut bb = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        ab += x * y;
        aa += x * x;
        bb += y * y;
    }

    let denom = aa.sqrt() * bb.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    (ab / denom).clamp(-1.0, 1.0)
}

/// Scale `v` to unit length in place. A zero vector is left untouched.
pub fn normalize(v: &mut [f32]) {
    let norm = magnitude(v);
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Normalized element-wise mean of `vectors`.
///
/// If the mean has zero magnitude the zero vector is returned as is. An empty input
/// yields an empty vector; the grouper never asks for the centroid of an empty cluster.
pub fn compute_centroid<'a, I>(vectors: I) -> Vec<f32>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut iter = vectors.into_iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };

    let mut acc = first.to_vec();
    let mut count = 1usize;
    for v in iter {
        debug_assert_eq!(v.len(), acc.len());
        for (a, x) in acc.iter_mut().zip(v.iter()) {
            *a += x;
        }
        count += 1;
    }

    let n = count as f32;
    for a in &mut acc {
        *a /= n;
    }
    normalize(&mut acc);
    acc
}

/// Fail with the index of the first NaN or infinite component.
pub fn check_finite(values: &[f32]) -> Result<()> {
    match values.iter().position(|x| !x.is_finite()) {
        Some(index) => Err(Error::NonFiniteValue { index }),
        None => Ok(()),
    }
}
