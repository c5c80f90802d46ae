use std::collections::HashMap;

use tracing::debug;

use super::distance::{distance_matrix, SAME_ANNOTATOR_DISTANCE};
use crate::models::Label;

/// One agglomeration step of the hierarchy.
///
/// Node ids follow the usual convention: `0..n` are the input points and the
/// cluster created by step `s` is node `n + s`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    /// Complete-linkage distance at which the two nodes were joined
    pub height: f64,
    /// Number of points under the new node
    pub size: usize,
}

/// Complete-linkage hierarchy over a set of points
#[derive(Debug, Clone)]
pub struct Dendrogram {
    n_points: usize,
    merges: Vec<Merge>,
}

impl Dendrogram {
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// Merge steps in the order they were performed
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Cut the hierarchy flat at `threshold`.
    ///
    /// Points end up together only when the hierarchy joins them at a height
    /// `<= threshold`. Ids run from 1 in order of first appearance.
    pub fn cut(&self, threshold: f64) -> Vec<u32> {
        let n = self.n_points;
        let mut sets = UnionFind::new(n);

        // Any leaf under a node stands in for the whole node
        let mut representative: Vec<usize> = (0..n).collect();
        for merge in &self.merges {
            let left = representative[merge.left];
            let right = representative[merge.right];
            if merge.height <= threshold {
                sets.union(left, right);
            }
            representative.push(left);
        }

        let mut ids: HashMap<usize, u32> = HashMap::new();
        let mut assignments = Vec::with_capacity(n);
        for point in 0..n {
            let root = sets.find(point);
            let next_id = ids.len() as u32 + 1;
            assignments.push(*ids.entry(root).or_insert(next_id));
        }

        assignments
    }
}

/// Build the complete-linkage hierarchy from a square distance matrix.
///
/// Each step joins the two clusters whose largest cross-distance is smallest;
/// ties go to the lowest pair of slots so the result is reproducible.
pub fn complete_linkage(distances: &[Vec<f64>]) -> Dendrogram {
    let n = distances.len();
    let mut d = distances.to_vec();
    let mut slot_node: Vec<Option<usize>> = (0..n).map(Some).collect();
    let mut slot_size = vec![1usize; n];
    let mut merges = Vec::with_capacity(n.saturating_sub(1));

    for step in 0..n.saturating_sub(1) {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..n {
            if slot_node[i].is_none() {
                continue;
            }
            for j in (i + 1)..n {
                if slot_node[j].is_none() {
                    continue;
                }
                if best.is_none_or(|(_, _, h)| d[i][j] < h) {
                    best = Some((i, j, d[i][j]));
                }
            }
        }

        let Some((i, j, height)) = best else {
            break;
        };
        let (Some(left), Some(right)) = (slot_node[i], slot_node[j]) else {
            break;
        };

        // Lance-Williams update for complete linkage
        for k in 0..n {
            if k == i || k == j || slot_node[k].is_none() {
                continue;
            }
            let joined = d[i][k].max(d[j][k]);
            d[i][k] = joined;
            d[k][i] = joined;
        }

        slot_size[i] += slot_size[j];
        slot_node[i] = Some(n + step);
        slot_node[j] = None;

        merges.push(Merge {
            left,
            right,
            height,
            size: slot_size[i],
        });
    }

    Dendrogram { n_points: n, merges }
}

/// Assign each label a flat cluster id in `[1, k]`.
///
/// Labels from the same annotator never share an id; `threshold_km` must be
/// below `f64::MAX` for that to hold.
pub fn cluster_labels(labels: &[Label], threshold_km: f64) -> Vec<u32> {
    debug_assert!(
        threshold_km < SAME_ANNOTATOR_DISTANCE,
        "threshold {} km would merge labels of one annotator",
        threshold_km
    );
    match labels.len() {
        0 => Vec::new(),
        1 => vec![1],
        n => {
            let dendrogram = complete_linkage(&distance_matrix(labels));
            let assignments = dendrogram.cut(threshold_km);
            debug!(
                "Clustered {} labels into {} clusters at {} km",
                n,
                assignments.iter().max().copied().unwrap_or(0),
                threshold_km
            );
            assignments
        }
    }
}

/// Disjoint-set forest over point indices
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, x: usize, y: usize) {
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x != root_y {
            let (small, large) = if root_x < root_y {
                (root_x, root_y)
            } else {
                (root_y, root_x)
            };
            self.parent[small] = large;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LabelType;

    fn label(id: i64, lat: f64, lng: f64, annotator: &str) -> Label {
        Label::new(id, LabelType::SurfaceProblem, lat, lng, annotator)
    }

    /// Deterministic scatter of labels around a block, spread over a few annotators
    fn scattered_labels(count: usize, annotators: usize) -> Vec<Label> {
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = || {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            (state >> 33) as f64 / (1u64 << 31) as f64
        };
        (0..count)
            .map(|i| {
                let lat = 38.9 + next() * 0.0005;
                let lng = -77.03 + next() * 0.0005;
                label(i as i64, lat, lng, &format!("turker_{}", i % annotators))
            })
            .collect()
    }

    fn partition(assignments: &[u32]) -> Vec<Vec<usize>> {
        let mut groups: std::collections::BTreeMap<u32, Vec<usize>> = Default::default();
        for (i, &id) in assignments.iter().enumerate() {
            groups.entry(id).or_default().push(i);
        }
        let mut sets: Vec<Vec<usize>> = groups.into_values().collect();
        sets.sort();
        sets
    }

    #[test]
    fn test_empty_and_single() {
        assert!(cluster_labels(&[], 0.0075).is_empty());
        assert_eq!(cluster_labels(&[label(1, 0.0, 0.0, "a")], 0.0075), vec![1]);
    }

    #[test]
    fn test_ids_follow_first_appearance() {
        let labels = vec![
            label(1, 0.0, 0.0, "a"),
            label(2, 1.0, 1.0, "b"),
            label(3, 0.0, 0.00001, "c"),
        ];
        assert_eq!(cluster_labels(&labels, 0.0075), vec![1, 2, 1]);
    }

    #[test]
    fn test_complete_linkage_does_not_chain() {
        // A-B and B-C are ~5.6 m apart, A-C ~11.1 m
        let labels = vec![
            label(1, 0.0, 0.0, "a"),
            label(2, 0.0, 0.00005, "b"),
            label(3, 0.0, 0.0001, "c"),
        ];
        let assignments = cluster_labels(&labels, 0.0075);

        assert_eq!(partition(&assignments).len(), 2);
        assert_ne!(assignments[0], assignments[2]);
    }

    #[test]
    fn test_merge_heights_are_non_decreasing() {
        let labels = scattered_labels(30, 6);
        let dendrogram = complete_linkage(&distance_matrix(&labels));

        assert_eq!(dendrogram.n_points(), 30);
        assert_eq!(dendrogram.merges().len(), 29);
        for pair in dendrogram.merges().windows(2) {
            assert!(pair[0].height <= pair[1].height);
        }
        assert_eq!(dendrogram.merges().last().unwrap().size, 30);
    }

    #[test]
    fn test_same_annotator_never_shares_cluster() {
        let labels = scattered_labels(40, 5);
        for threshold in [0.0075, 0.05, 1.0, 1_000.0, 1e300] {
            let assignments = cluster_labels(&labels, threshold);
            for group in partition(&assignments) {
                let mut annotators: Vec<&str> =
                    group.iter().map(|&i| labels[i].annotator_id.as_str()).collect();
                let before = annotators.len();
                annotators.sort();
                annotators.dedup();
                assert_eq!(annotators.len(), before, "threshold {}", threshold);
            }
        }
    }

    #[test]
    fn test_same_annotator_identical_coords_stay_apart() {
        let labels = vec![label(1, 38.9, -77.0, "a"), label(2, 38.9, -77.0, "a")];
        assert_eq!(cluster_labels(&labels, 1_000.0), vec![1, 2]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "would merge labels of one annotator")]
    fn test_unbounded_threshold_is_rejected() {
        let labels = vec![label(1, 38.9, -77.0, "a"), label(2, 38.9, -77.0, "a")];
        cluster_labels(&labels, f64::MAX);
    }

    #[test]
    fn test_clustering_is_deterministic() {
        let labels = scattered_labels(25, 4);
        let first = cluster_labels(&labels, 0.02);
        let second = cluster_labels(&labels, 0.02);
        assert_eq!(first, second);
    }

    #[test]
    fn test_larger_threshold_only_merges() {
        let labels = scattered_labels(30, 6);
        let dendrogram = complete_linkage(&distance_matrix(&labels));
        let thresholds = [0.005, 0.01, 0.02, 0.04, 0.08];

        for pair in thresholds.windows(2) {
            let fine = dendrogram.cut(pair[0]);
            let coarse = dendrogram.cut(pair[1]);
            for i in 0..labels.len() {
                for j in 0..labels.len() {
                    if fine[i] == fine[j] {
                        assert_eq!(coarse[i], coarse[j]);
                    }
                }
            }
        }
    }

    #[test]
    fn test_far_apart_points_stay_separate() {
        // ~10 km apart
        let labels = vec![label(1, 0.0, 0.0, "a"), label(2, 0.09, 0.0, "b")];
        assert_eq!(cluster_labels(&labels, 0.0075), vec![1, 2]);
    }
}
