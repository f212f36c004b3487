//! Similarity-threshold clustering over raw vectors.
//!
//! Two points are linked when their cosine similarity is at least `eps`; clusters are
//! the connected components of that graph. This is single-linkage agglomeration cut at
//! a fixed similarity, so the grouping is transitive: if A~B and B~C clear the
//! threshold, A and C share a cluster even when A~C does not.
//!
//! Components with fewer than `min_cluster_size` points are not kept together; each of
//! their points becomes its own cluster. Nothing is ever labeled as noise.
//!
//! ## Complexity
//!
//! - **Time**: O(n² · d) for the pairwise similarities.
//! - **Space**: O(n²) for the edge list.
//!
//! [`EmbeddingsGrouper::recluster`](super::EmbeddingsGrouper::recluster) runs the same
//! algorithm over its cached similarities.

use super::traits::Clustering;
use super::util::{self, Edge};
use crate::error::{Error, Result};
use crate::vector;

/// Connected-components clustering at a cosine-similarity cutoff.
#[derive(Debug, Clone)]
pub struct SimilarityThreshold {
    /// Minimum cosine similarity for two points to be linked.
    eps: f32,
    /// Minimum component size kept as one cluster.
    min_cluster_size: usize,
}

impl SimilarityThreshold {
    /// Create a clusterer linking points with cosine similarity `>= eps`.
    pub fn new(eps: f32) -> Self {
        Self {
            eps,
            min_cluster_size: 1,
        }
    }

    /// Set the similarity cutoff.
    pub fn with_eps(mut self, eps: f32) -> Self {
        self.eps = eps;
        self
    }

    /// Set the minimum size of a component kept together.
    pub fn with_min_cluster_size(mut self, min_cluster_size: usize) -> Self {
        self.min_cluster_size = min_cluster_size;
        self
    }

    fn validate(&self, data: &[Vec<f32>]) -> Result<()> {
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }
        validate_eps(self.eps)?;

        let dim = data[0].len();
        if dim == 0 {
            return Err(Error::EmptyEmbedding);
        }
        for point in data {
            if point.len() != dim {
                return Err(Error::DimensionMismatch {
                    expected: dim,
                    found: point.len(),
                });
            }
            vector::check_finite(point)?;
        }
        Ok(())
    }
}

impl Default for SimilarityThreshold {
    fn default() -> Self {
        Self::new(super::grouper::DEFAULT_EPS)
    }
}

impl Clustering for SimilarityThreshold {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<usize>> {
        self.validate(data)?;

        let n = data.len();
        let mut edges: Vec<Edge> = Vec::with_capacity(n * (n - 1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                edges.push((i, j, vector::cosine_similarity(&data[i], &data[j])));
            }
        }

        let groups = util::components_at_threshold(n, &edges, self.eps, self.min_cluster_size);
        let mut labels = vec![0usize; n];
        for (label, group) in groups.iter().enumerate() {
            for &i in group {
                labels[i] = label;
            }
        }
        Ok(labels)
    }

    /// The count is discovered from the data, so this returns 0.
    fn n_clusters(&self) -> usize {
        0
    }
}

pub(crate) fn validate_eps(eps: f32) -> Result<()> {
    validate_cutoff("eps", eps)
}

/// Cosine cutoffs outside `[-1, 1]` cannot mean anything.
pub(crate) fn validate_cutoff(name: &'static str, value: f32) -> Result<()> {
    if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
        return Err(Error::InvalidParameter {
            name,
            message: "must be a finite cosine similarity in [-1, 1]",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_directions_two_clusters() {
        let data = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.99, 0.05, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.02, 0.98, 0.0],
            vec![0.95, 0.1, 0.0],
        ];

        let labels = SimilarityThreshold::new(0.9).fit_predict(&data).unwrap();
        assert_eq!(labels, vec![0, 0, 1, 1, 0]);
    }

    #[test]
    fn chain_is_transitive() {
        // Consecutive points are ~10 degrees apart; the ends are far apart.
        let data: Vec<Vec<f32>> = (0..6)
            .map(|i| {
                let a = (i as f32 * 10.0).to_radians();
                vec![a.cos(), a.sin()]
            })
            .collect();
        assert!(vector::cosine_similarity(&data[0], &data[5]) < 0.9);

        let labels = SimilarityThreshold::new(0.98).fit_predict(&data).unwrap();
        assert!(labels.iter().all(|&l| l == 0));
    }

    #[test]
    fn min_cluster_size_keeps_pairs_apart() {
        let data = vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];
        let labels = SimilarityThreshold::new(0.9)
            .with_min_cluster_size(3)
            .fit_predict(&data)
            .unwrap();
        assert_eq!(labels, vec![0, 1, 2]);
    }

    #[test]
    fn single_point() {
        let labels = SimilarityThreshold::default()
            .fit_predict(&[vec![0.3, 0.4]])
            .unwrap();
        assert_eq!(labels, vec![0]);
    }

    #[test]
    fn invalid_inputs() {
        let st = SimilarityThreshold::new(0.8);
        assert_eq!(st.fit_predict(&[]), Err(Error::EmptyInput));
        assert_eq!(
            st.fit_predict(&[vec![1.0, 0.0], vec![1.0]]),
            Err(Error::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
        assert!(matches!(
            st.fit_predict(&[vec![f32::NAN, 0.0]]),
            Err(Error::NonFiniteValue { index: 0 })
        ));
        assert!(SimilarityThreshold::new(1.5)
            .fit_predict(&[vec![1.0]])
            .is_err());
        assert!(SimilarityThreshold::new(f32::NAN)
            .fit_predict(&[vec![1.0]])
            .is_err());
    }
}
