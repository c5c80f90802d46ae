use tracing::info;

use crate::clustering::{build_clusters, cluster_labels};
use crate::models::{
    Centroid, ConsensusResult, ConsensusStatus, Label, OutputPolicy, OutputRecord, RunConfig,
    TypeSummary,
};

use super::{execute_consensus, partition_by_type};

/// Result of a full pipeline run over every label type
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    /// Cluster assignment table, grouped by label type
    pub records: Vec<OutputRecord>,
    /// Accepted clusters with their centroids
    pub accepted: Vec<ConsensusResult>,
    /// Labels in disputed clusters, for manual review
    pub disputed_label_ids: Vec<i64>,
    /// Per-type counts, in processing order
    pub summaries: Vec<TypeSummary>,
}

impl PipelineOutput {
    /// Largest global cluster id handed out, 0 for an empty run
    pub fn max_cluster_id(&self) -> u32 {
        self.records
            .iter()
            .map(|r| r.global_cluster_id)
            .max()
            .unwrap_or(0)
    }
}

/// Run the clustering pipeline over cleaned labels
///
/// For each recognized type, in order:
/// 1. Skip empty groups
/// 2. Give a lone label its own cluster without voting
/// 3. Otherwise cluster by distance and apply the majority vote
/// 4. Shift local ids past every id assigned to earlier types
///
/// `config` is expected to have passed `RunConfig::validate`; in particular
/// the distance threshold must stay below `f64::MAX` for labels of one
/// annotator to stay apart.
pub fn run_pipeline(labels: &[Label], config: &RunConfig) -> PipelineOutput {
    let groups = partition_by_type(labels, &config.recognized_types);
    let majority_threshold = config.majority.threshold();

    let mut output = PipelineOutput::default();
    let mut offset: u32 = 0;

    for &label_type in &config.recognized_types {
        let Some(group) = groups.get(&label_type) else {
            continue;
        };
        if group.is_empty() {
            continue;
        }

        let (assignments, withheld, summary) = if let [label] = group.as_slice() {
            output.accepted.push(ConsensusResult {
                label_type,
                local_cluster_id: 1,
                size: 1,
                centroid: Some(Centroid {
                    lat: label.lat,
                    lng: label.lng,
                }),
                status: ConsensusStatus::Accepted,
            });
            let summary = TypeSummary {
                label_type,
                distance_threshold: config.distance_threshold,
                label_count: 1,
                cluster_count: 1,
                accepted_count: 1,
                disputed_count: 0,
            };
            (vec![1], Vec::new(), summary)
        } else {
            let assignments = cluster_labels(group, config.distance_threshold);
            let clusters = build_clusters(&assignments);
            let outcome = execute_consensus(label_type, group, &clusters, majority_threshold);

            let summary = TypeSummary {
                label_type,
                distance_threshold: config.distance_threshold,
                label_count: group.len(),
                cluster_count: clusters.len(),
                accepted_count: outcome.accepted_count,
                disputed_count: outcome.disputed_count,
            };

            let withheld: Vec<u32> = outcome
                .results
                .iter()
                .filter(|r| !r.is_accepted())
                .map(|r| r.local_cluster_id)
                .collect();

            output.accepted.extend(outcome.accepted().cloned());
            output.disputed_label_ids.extend(outcome.disputed_label_ids);
            (assignments, withheld, summary)
        };

        info!(
            "{}: {} labels, {} clusters at {} km, {} accepted, {} disputed",
            summary.label_type,
            summary.label_count,
            summary.cluster_count,
            summary.distance_threshold,
            summary.accepted_count,
            summary.disputed_count
        );

        for (label, &local_id) in group.iter().zip(assignments.iter()) {
            if config.output_policy == OutputPolicy::AcceptedOnly && withheld.contains(&local_id) {
                continue;
            }
            output.records.push(OutputRecord {
                label_id: label.label_id,
                label_type,
                global_cluster_id: local_id + offset,
            });
        }

        offset += assignments.iter().max().copied().unwrap_or(0);
        output.summaries.push(summary);
    }

    info!(
        "Pipeline complete: {} rows, {} clusters, {} labels disputed",
        output.records.len(),
        offset,
        output.disputed_label_ids.len()
    );

    output
}
