use crate::error::Result;

/// Common interface for hard clustering algorithms (one label per point).
pub trait Clustering {
    /// Cluster `data` and return one label per input point.
    ///
    /// Labels are dense (`0..k`) and numbered in order of first appearance.
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<usize>>;

    /// The configured number of clusters (if applicable).
    ///
    /// Threshold-based algorithms discover the count from the data and return 0.
    fn n_clusters(&self) -> usize;
}
