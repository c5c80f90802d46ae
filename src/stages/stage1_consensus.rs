use tracing::debug;

use crate::models::{Centroid, Cluster, ConsensusResult, ConsensusStatus, Label, LabelType};

/// Result of the Stage 1 majority vote for one label type
#[derive(Debug, Clone, Default)]
pub struct ConsensusOutcome {
    /// One result per cluster, in cluster order
    pub results: Vec<ConsensusResult>,
    /// Labels in disputed clusters, queued for manual review
    pub disputed_label_ids: Vec<i64>,
    pub accepted_count: usize,
    pub disputed_count: usize,
}

impl ConsensusOutcome {
    /// Accepted results only
    pub fn accepted(&self) -> impl Iterator<Item = &ConsensusResult> {
        self.results.iter().filter(|r| r.is_accepted())
    }
}

/// Unweighted mean of the members' coordinates
pub fn centroid(members: &[&Label]) -> Option<Centroid> {
    if members.is_empty() {
        return None;
    }
    let n = members.len() as f64;
    let lat = members.iter().map(|l| l.lat).sum::<f64>() / n;
    let lng = members.iter().map(|l| l.lng).sum::<f64>() / n;
    Some(Centroid { lat, lng })
}

/// Execute Stage 1: majority vote over the clusters of one label type
///
/// A cluster with at least `majority_threshold` members is accepted and gets
/// a centroid. Smaller clusters are disputed and their labels are collected
/// for review. Member indices must point into `labels`.
pub fn execute_consensus(
    label_type: LabelType,
    labels: &[Label],
    clusters: &[Cluster],
    majority_threshold: usize,
) -> ConsensusOutcome {
    let mut outcome = ConsensusOutcome::default();

    for cluster in clusters {
        let members: Vec<&Label> = cluster.member_indices.iter().map(|&i| &labels[i]).collect();

        let result = if members.len() >= majority_threshold {
            outcome.accepted_count += 1;
            ConsensusResult {
                label_type,
                local_cluster_id: cluster.local_id,
                size: members.len(),
                centroid: centroid(&members),
                status: ConsensusStatus::Accepted,
            }
        } else {
            outcome.disputed_count += 1;
            outcome
                .disputed_label_ids
                .extend(members.iter().map(|l| l.label_id));
            ConsensusResult {
                label_type,
                local_cluster_id: cluster.local_id,
                size: members.len(),
                centroid: None,
                status: ConsensusStatus::Disputed,
            }
        };
        outcome.results.push(result);
    }

    debug!("We agreed on this many {} labels: {}", label_type, outcome.accepted_count);
    debug!(
        "We disagreed on this many {} labels: {}",
        label_type, outcome.disputed_count
    );

    outcome
}
