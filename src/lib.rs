pub mod api;
pub mod clustering;
pub mod io;
pub mod models;
pub mod stages;

pub use api::{LabelSource, SidewalkClient, SidewalkConfig};
pub use clustering::{build_clusters, cluster_labels, complete_linkage, label_distance};
pub use io::{parse_label_file, parse_label_json, records_to_json, write_records, RunReport};
pub use models::{
    ConfigError, ConsensusResult, ConsensusStatus, Label, LabelType, MajorityPolicy,
    OutputPolicy, OutputRecord, RawLabel, RunConfig,
};
pub use stages::{clean_labels, execute_consensus, run_pipeline, PipelineOutput};
