use thiserror::Error;

use super::LabelType;

/// Default clustering cutoff in kilometers (7.5 meters)
pub const DEFAULT_DISTANCE_THRESHOLD_KM: f64 = 0.0075;

/// Default number of crowd annotators assigned to a route
pub const DEFAULT_N_LABELERS: u32 = 5;

/// Invalid run parameters
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("distance threshold must be a positive finite number of kilometers, got {0}")]
    InvalidDistanceThreshold(f64),
    #[error("majority threshold must be at least 1")]
    ZeroMajorityThreshold,
    #[error("crowd majority policy needs at least one labeler")]
    NoLabelers,
    #[error("no label types selected for clustering")]
    NoRecognizedTypes,
}

/// How many members a cluster needs before its centroid is trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MajorityPolicy {
    /// Small trusted-reviewer runs: two agreeing reviewers suffice
    GroundTruth,
    /// Crowd runs: a simple majority of the expected annotators
    Crowd { n_labelers: u32 },
    /// Explicit member count
    Fixed(usize),
}

impl MajorityPolicy {
    /// Member count a cluster must reach to be accepted
    pub fn threshold(&self) -> usize {
        match *self {
            MajorityPolicy::GroundTruth => 2,
            MajorityPolicy::Crowd { n_labelers } => n_labelers.div_ceil(2) as usize,
            MajorityPolicy::Fixed(m) => m,
        }
    }
}

impl Default for MajorityPolicy {
    fn default() -> Self {
        MajorityPolicy::Crowd {
            n_labelers: DEFAULT_N_LABELERS,
        }
    }
}

/// Which labels receive a row in the output table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputPolicy {
    /// Every clustered label, whatever its consensus status
    #[default]
    AllClusters,
    /// Only members of accepted (or single-label) clusters
    AcceptedOnly,
}

/// Parameters for one pipeline run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Cutoff in kilometers above which labels are never merged
    pub distance_threshold: f64,
    pub majority: MajorityPolicy,
    /// Types to cluster, in processing order; others are dropped
    pub recognized_types: Vec<LabelType>,
    pub output_policy: OutputPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD_KM,
            majority: MajorityPolicy::default(),
            recognized_types: LabelType::ALL.to_vec(),
            output_policy: OutputPolicy::default(),
        }
    }
}

impl RunConfig {
    /// Reject parameters the pipeline cannot honor.
    ///
    /// The threshold must stay below `f64::MAX`, the distance reserved for
    /// same-annotator pairs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.distance_threshold;
        if !t.is_finite() || t <= 0.0 || t >= f64::MAX {
            return Err(ConfigError::InvalidDistanceThreshold(t));
        }
        if let MajorityPolicy::Crowd { n_labelers: 0 } = self.majority {
            return Err(ConfigError::NoLabelers);
        }
        if self.majority.threshold() == 0 {
            return Err(ConfigError::ZeroMajorityThreshold);
        }
        if self.recognized_types.is_empty() {
            return Err(ConfigError::NoRecognizedTypes);
        }
        Ok(())
    }
}
