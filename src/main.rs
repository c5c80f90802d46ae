use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use sidewalk_cluster::models::{DEFAULT_DISTANCE_THRESHOLD_KM, DEFAULT_N_LABELERS};
use sidewalk_cluster::stages::has_valid_longitude;
use sidewalk_cluster::{
    clean_labels, parse_label_file, run_pipeline, write_records, LabelSource, LabelType,
    MajorityPolicy, OutputPolicy, PipelineOutput, RawLabel, RunConfig, RunReport, SidewalkClient,
    SidewalkConfig,
};

#[derive(Parser)]
#[command(name = "sidewalk-cluster")]
#[command(author, version, about = "Consensus clustering of crowdsourced sidewalk labels", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a route's labels from the sidewalk service, cluster them, and submit the result
    Run {
        /// Route whose labels should be clustered
        route_id: u32,

        /// HIT whose ground-truth labels should be clustered
        #[arg(long)]
        hit_id: Option<String>,

        /// Number of crowd annotators to cluster (ignored with --hit-id)
        #[arg(long, default_value_t = DEFAULT_N_LABELERS)]
        n_labelers: u32,

        /// Cluster distance threshold in kilometers
        #[arg(long, default_value_t = DEFAULT_DISTANCE_THRESHOLD_KM)]
        clust_thresh: f64,

        /// Also write the cluster table to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Cluster without submitting the result
        #[arg(long)]
        dry_run: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Cluster a local label feed file
    Cluster {
        /// Input label feed (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the cluster table (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Output file for a per-type text report
        #[arg(long)]
        report: Option<PathBuf>,

        /// Cluster distance threshold in kilometers
        #[arg(long, default_value_t = DEFAULT_DISTANCE_THRESHOLD_KM)]
        clust_thresh: f64,

        /// Fixed number of members a cluster needs to be accepted
        #[arg(long, conflicts_with = "n_labelers")]
        majority: Option<usize>,

        /// Expected number of annotators; majority is half of this, rounded up
        #[arg(long)]
        n_labelers: Option<u32>,

        /// Leave members of disputed clusters out of the table
        #[arg(long)]
        accepted_only: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Summarize a label feed file without clustering
    Analyze {
        /// Input label feed (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            route_id,
            hit_id,
            n_labelers,
            clust_thresh,
            output,
            dry_run,
            verbose,
        } => {
            setup_logging(verbose);
            let source = match hit_id {
                Some(hit_id) => LabelSource::GroundTruth { hit_id },
                None => LabelSource::Crowd { n_labelers },
            };
            run_route(route_id, source, clust_thresh, output, dry_run).await
        }
        Commands::Cluster {
            input,
            output,
            report,
            clust_thresh,
            majority,
            n_labelers,
            accepted_only,
            verbose,
        } => {
            setup_logging(verbose);
            let majority = match (majority, n_labelers) {
                (Some(m), _) => MajorityPolicy::Fixed(m),
                (None, Some(n_labelers)) => MajorityPolicy::Crowd { n_labelers },
                (None, None) => MajorityPolicy::default(),
            };
            let config = RunConfig {
                distance_threshold: clust_thresh,
                majority,
                output_policy: if accepted_only {
                    OutputPolicy::AcceptedOnly
                } else {
                    OutputPolicy::AllClusters
                },
                ..Default::default()
            };
            cluster_file(input, output, report, &config)
        }
        Commands::Analyze { input, verbose } => {
            setup_logging(verbose);
            analyze_feed(input)
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

/// Clean a raw feed and run the pipeline over it
fn cluster_raw(raw: &[RawLabel], config: &RunConfig) -> Result<PipelineOutput> {
    config.validate().context("Invalid clustering parameters")?;

    let cleaned = clean_labels(raw, &config.recognized_types);
    info!(
        "Clustering {} labels ({} unrecognized, {} incomplete, {} invalid longitude dropped), majority threshold {}",
        cleaned.labels.len(),
        cleaned.dropped_unrecognized,
        cleaned.dropped_incomplete,
        cleaned.dropped_invalid_lng,
        config.majority.threshold()
    );

    Ok(run_pipeline(&cleaned.labels, config))
}

async fn run_route(
    route_id: u32,
    source: LabelSource,
    clust_thresh: f64,
    output: Option<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    let config = RunConfig {
        distance_threshold: clust_thresh,
        majority: source.majority_policy(),
        ..Default::default()
    };

    let client = SidewalkClient::new(SidewalkConfig::from_env());
    let raw = client
        .fetch_labels(route_id, &source)
        .await
        .context("Failed to retrieve labels to cluster")?;

    let result = cluster_raw(&raw, &config)?;

    if let Some(path) = output {
        write_records(&result.records, &path)?;
        info!("Cluster table written to {:?}", path);
    }

    if dry_run {
        info!("Skipping submission (--dry-run)");
    } else {
        client
            .submit_results(route_id, config.distance_threshold, &result.records)
            .await
            .context("Failed to submit clustering results")?;
    }

    info!(
        "Complete: {} rows across {} clusters",
        result.records.len(),
        result.max_cluster_id()
    );

    Ok(())
}

fn cluster_file(
    input: PathBuf,
    output: PathBuf,
    report: Option<PathBuf>,
    config: &RunConfig,
) -> Result<()> {
    info!("Loading labels from {:?}", input);
    let raw = parse_label_file(&input).context("Failed to parse input label feed")?;

    let result = cluster_raw(&raw, config)?;

    write_records(&result.records, &output)?;
    info!("Cluster table written to {:?}", output);

    if let Some(path) = report {
        RunReport::new(&result).write_file(&path)?;
        info!("Report written to {:?}", path);
    }

    info!(
        "Complete: {} rows across {} clusters, {} labels disputed",
        result.records.len(),
        result.max_cluster_id(),
        result.disputed_label_ids.len()
    );

    Ok(())
}

fn analyze_feed(input: PathBuf) -> Result<()> {
    info!("Analyzing label feed from {:?}", input);
    let raw = parse_label_file(&input).context("Failed to parse input label feed")?;

    let mut counts: BTreeMap<LabelType, usize> = BTreeMap::new();
    let mut annotators: BTreeMap<LabelType, BTreeSet<&str>> = BTreeMap::new();
    let mut unrecognized = 0;
    let mut incomplete = 0;
    let mut invalid_lng = 0;

    for row in &raw {
        if !row.is_complete() {
            incomplete += 1;
        } else if row.lng.is_some_and(|lng| !has_valid_longitude(lng)) {
            invalid_lng += 1;
        }
        match row.label_type.parse::<LabelType>() {
            Ok(label_type) => {
                *counts.entry(label_type).or_default() += 1;
                if let Some(turker_id) = row.turker_id.as_deref() {
                    annotators.entry(label_type).or_default().insert(turker_id);
                }
            }
            Err(_) => unrecognized += 1,
        }
    }

    println!("Label Feed Analysis");
    println!("===================");
    println!("Total labels: {}", raw.len());
    println!("Unrecognized types: {}", unrecognized);
    println!("Missing coordinates or annotator: {}", incomplete);
    println!("Invalid longitudes: {}", invalid_lng);
    println!();

    println!("Label Types");
    println!("-----------");
    for label_type in LabelType::ALL {
        println!(
            "{}: {} labels from {} annotators",
            label_type,
            counts.get(&label_type).copied().unwrap_or(0),
            annotators.get(&label_type).map_or(0, BTreeSet::len)
        );
    }

    Ok(())
}
