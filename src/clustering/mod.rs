pub mod distance;
pub mod linkage;

pub use distance::*;
pub use linkage::*;

use std::collections::BTreeMap;

use crate::models::Cluster;

/// Group flat cluster assignments into clusters, ordered by local id
pub fn build_clusters(assignments: &[u32]) -> Vec<Cluster> {
    let mut groups: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (index, &local_id) in assignments.iter().enumerate() {
        groups.entry(local_id).or_default().push(index);
    }

    groups
        .into_iter()
        .map(|(local_id, member_indices)| Cluster {
            local_id,
            member_indices,
        })
        .collect()
}
