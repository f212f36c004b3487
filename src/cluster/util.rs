use std::collections::HashMap;

/// Disjoint-set forest over `0..n`.
#[derive(Clone, Debug)]
pub(crate) struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    pub(crate) fn find(&mut self, mut x: usize) -> usize {
        // Path halving.
        while self.parent[x] != x {
            let grandparent = self.parent[self.parent[x]];
            self.parent[x] = grandparent;
            x = grandparent;
        }
        x
    }

    /// Merge the sets of `a` and `b`. Returns `true` if they were disjoint.
    pub(crate) fn union(&mut self, a: usize, b: usize) -> bool {
        let (mut big, mut small) = (self.find(a), self.find(b));
        if big == small {
            return false;
        }
        if self.size[big] < self.size[small] {
            std::mem::swap(&mut big, &mut small);
        }
        self.parent[small] = big;
        self.size[big] += self.size[small];
        true
    }

    /// Size of the set containing `x`.
    pub(crate) fn set_size(&mut self, x: usize) -> usize {
        let root = self.find(x);
        self.size[root]
    }
}

/// A similarity edge `(i, j, sim)` between two point indices.
pub(crate) type Edge = (usize, usize, f32);

fn link_at_threshold(n: usize, edges: &[Edge], threshold: f32) -> UnionFind {
    let mut uf = UnionFind::new(n);
    for &(i, j, sim) in edges {
        if sim >= threshold {
            uf.union(i, j);
        }
    }
    uf
}

/// Connected components of the graph whose edges have similarity `>= threshold`.
///
/// Components with fewer than `min_cluster_size` points are not kept together: each of
/// their points becomes a singleton. Groups are ordered by their smallest index and
/// members are ascending.
pub(crate) fn components_at_threshold(
    n: usize,
    edges: &[Edge],
    threshold: f32,
    min_cluster_size: usize,
) -> Vec<Vec<usize>> {
    let mut uf = link_at_threshold(n, edges, threshold);
    let min_cluster_size = min_cluster_size.max(1);

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut root_to_group: HashMap<usize, usize> = HashMap::new();
    for i in 0..n {
        if uf.set_size(i) < min_cluster_size {
            groups.push(vec![i]);
            continue;
        }
        let root = uf.find(i);
        let g = *root_to_group.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[g].push(i);
    }
    groups
}

/// Number of groups [`components_at_threshold`] would produce, without building them.
pub(crate) fn count_at_threshold(
    n: usize,
    edges: &[Edge],
    threshold: f32,
    min_cluster_size: usize,
) -> usize {
    let mut uf = link_at_threshold(n, edges, threshold);
    let min_cluster_size = min_cluster_size.max(1);

    let mut count = 0;
    for i in 0..n {
        // Small sets count once per member, kept sets once at their root.
        let root = uf.find(i);
        if root == i || uf.set_size(root) < min_cluster_size {
            count += 1;
        }
    }
    count
}

/// Linear-interpolated percentile (`0..=100`) of an ascending slice.
pub(crate) fn percentile(sorted: &[f32], p: f32) -> Option<f32> {
    let last = sorted.len().checked_sub(1)?;
    // Rank in f64: `last as f32` rounds past the end once there are 2^24 pairs.
    let rank = (f64::from(p) / 100.0).clamp(0.0, 1.0) * last as f64;
    let lo = (rank.floor() as usize).min(last);
    let hi = (rank.ceil() as usize).min(last);
    let frac = (rank - lo as f64) as f32;
    // Bounded so rounding cannot break monotonicity in `p`.
    let value = sorted[lo] + (sorted[hi] - sorted[lo]) * frac;
    Some(value.max(sorted[lo]).min(sorted[hi]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_find_merges() {
        let mut uf = UnionFind::new(5);
        assert!(uf.union(0, 1));
        assert!(uf.union(1, 2));
        assert!(!uf.union(0, 2));
        assert_eq!(uf.find(0), uf.find(2));
        assert_ne!(uf.find(0), uf.find(3));
        assert_eq!(uf.set_size(2), 3);
        assert_eq!(uf.set_size(4), 1);
    }

    #[test]
    fn components_are_transitive() {
        // 0~1 and 1~2 are linked, 0~2 is not.
        let edges = vec![(0, 1, 0.9), (1, 2, 0.9), (0, 2, 0.1), (2, 3, 0.2)];
        let groups = components_at_threshold(4, &edges, 0.8, 1);
        assert_eq!(groups, vec![vec![0, 1, 2], vec![3]]);
        assert_eq!(count_at_threshold(4, &edges, 0.8, 1), 2);
    }

    #[test]
    fn small_components_split_into_singletons() {
        let edges = vec![(0, 1, 0.95), (2, 3, 0.95), (3, 4, 0.95)];
        let groups = components_at_threshold(5, &edges, 0.9, 3);
        assert_eq!(groups, vec![vec![0], vec![1], vec![2, 3, 4]]);
        assert_eq!(count_at_threshold(5, &edges, 0.9, 3), 3);
    }

    #[test]
    fn threshold_is_inclusive() {
        let edges = vec![(0, 1, 0.5)];
        assert_eq!(count_at_threshold(2, &edges, 0.5, 1), 1);
        assert_eq!(count_at_threshold(2, &edges, 0.500_1, 1), 2);
    }

    #[test]
    fn percentile_interpolates() {
        let sorted = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 0.0), Some(0.0));
        assert_eq!(percentile(&sorted, 100.0), Some(4.0));
        assert_eq!(percentile(&sorted, 50.0), Some(2.0));
        assert!((percentile(&sorted, 80.0).unwrap() - 3.2).abs() < 1e-6);
        assert_eq!(percentile(&[0.7], 90.0), Some(0.7));
        assert_eq!(percentile(&[], 90.0), None);
    }

    #[test]
    fn percentile_stays_in_bounds_past_f32_precision() {
        // `last` = 2^24 + 3 is not representable in f32 and rounds up.
        let len = (1usize << 24) + 4;
        assert!((len - 1) as f32 as usize > len - 1);

        let mut sorted = vec![0.5f32; len];
        sorted[len - 1] = 0.9;
        assert_eq!(percentile(&sorted, 100.0), Some(0.9));
        assert_eq!(percentile(&sorted, 99.0), Some(0.5));
        assert_eq!(percentile(&sorted, 0.0), Some(0.5));

        // The upper half is 1.0, so the median rank lands exactly on the boundary.
        for x in &mut sorted[len / 2..] {
            *x = 1.0;
        }
        let median = percentile(&sorted, 50.0).unwrap();
        assert!((0.5..=1.0).contains(&median));
        assert_eq!(percentile(&sorted, 100.0), Some(1.0));
    }
}
