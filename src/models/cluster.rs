use serde::{Deserialize, Serialize};

use super::LabelType;

/// A group of labels of one type judged to mark the same feature.
///
/// Local ids are only unique within one type's clustering run.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub local_id: u32,
    /// Indices into the type group the cluster was built from
    pub member_indices: Vec<usize>,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.member_indices.len()
    }
}

/// Consensus status of a cluster after the majority vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusStatus {
    /// Enough annotators agreed; the centroid is trusted
    Accepted,
    /// Too few annotators; members go to manual review
    Disputed,
}

/// Mean position of a cluster's members, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub lat: f64,
    pub lng: f64,
}

/// Outcome of the majority vote for a single cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub label_type: LabelType,
    pub local_cluster_id: u32,
    pub size: usize,
    /// Only computed for accepted clusters
    pub centroid: Option<Centroid>,
    pub status: ConsensusStatus,
}

impl ConsensusResult {
    pub fn is_accepted(&self) -> bool {
        self.status == ConsensusStatus::Accepted
    }
}

/// One row of the cluster assignment table sent to the result sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub label_id: i64,
    pub label_type: LabelType,
    /// Unique across every label type of the run
    #[serde(rename = "cluster")]
    pub global_cluster_id: u32,
}

/// Per-type counts reported after clustering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeSummary {
    pub label_type: LabelType,
    pub distance_threshold: f64,
    pub label_count: usize,
    pub cluster_count: usize,
    pub accepted_count: usize,
    pub disputed_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_record_wire_fields() {
        let record = OutputRecord {
            label_id: 42,
            label_type: LabelType::CurbRamp,
            global_cluster_id: 3,
        };
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["label_id"], 42);
        assert_eq!(value["label_type"], "CurbRamp");
        assert_eq!(value["cluster"], 3);
        assert!(value.get("global_cluster_id").is_none());
    }
}
