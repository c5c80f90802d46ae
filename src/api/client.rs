use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{debug, info};

use crate::io::{parse_label_value, records_to_json};
use crate::models::{MajorityPolicy, OutputRecord, RawLabel};

/// Base URL used when `SIDEWALK_API_URL` is not set
pub const DEFAULT_API_URL: &str = "http://localhost:9000";

/// Configuration for the sidewalk service client
#[derive(Debug, Clone)]
pub struct SidewalkConfig {
    /// Service root, without a trailing slash
    pub base_url: String,
}

impl SidewalkConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("SIDEWALK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(base_url)
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for SidewalkConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

/// Which set of labels to pull for a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelSource {
    /// Labels from trusted reviewers on one HIT
    GroundTruth { hit_id: String },
    /// Labels from the first `n_labelers` crowd annotators
    Crowd { n_labelers: u32 },
}

impl LabelSource {
    /// Majority preset matching this kind of run
    pub fn majority_policy(&self) -> MajorityPolicy {
        match self {
            LabelSource::GroundTruth { .. } => MajorityPolicy::GroundTruth,
            LabelSource::Crowd { n_labelers } => MajorityPolicy::Crowd {
                n_labelers: *n_labelers,
            },
        }
    }
}

/// Sidewalk service client
pub struct SidewalkClient {
    client: Client,
    config: SidewalkConfig,
}

impl SidewalkClient {
    pub fn new(config: SidewalkConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Endpoint serving the labels to cluster for a route
    pub fn labels_url(&self, route_id: u32, source: &LabelSource) -> String {
        match source {
            LabelSource::GroundTruth { hit_id } => format!(
                "{}/labelsToCluster/{}/{}",
                self.config.base_url, route_id, hit_id
            ),
            LabelSource::Crowd { n_labelers } => format!(
                "{}/nonGTLabelsToCluster/{}/{}",
                self.config.base_url, route_id, n_labelers
            ),
        }
    }

    /// Endpoint accepting the cluster assignment table
    pub fn results_url(&self, route_id: u32, distance_threshold: f64) -> String {
        format!(
            "{}/clusteringResults/{}/{}",
            self.config.base_url, route_id, distance_threshold
        )
    }

    /// Fetch the raw labels for a route
    pub async fn fetch_labels(&self, route_id: u32, source: &LabelSource) -> Result<Vec<RawLabel>> {
        let url = self.labels_url(route_id, source);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch labels from {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Sidewalk API error: {} - {}", status, body);
        }

        let value: serde_json::Value = response
            .json()
            .await
            .context("Failed to decode label feed response")?;
        let labels = parse_label_value(value)?;

        info!("Fetched {} labels for route {}", labels.len(), route_id);
        Ok(labels)
    }

    /// Submit the cluster assignment table for a route
    pub async fn submit_results(
        &self,
        route_id: u32,
        distance_threshold: f64,
        records: &[OutputRecord],
    ) -> Result<()> {
        let url = self.results_url(route_id, distance_threshold);
        let body = records_to_json(records)?;
        debug!("POST {} ({} rows)", url, records.len());

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json; charset=utf-8")
            .body(body)
            .send()
            .await
            .with_context(|| format!("Failed to submit results to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Sidewalk API error: {} - {}", status, body);
        }

        info!("Submitted {} cluster rows for route {}", records.len(), route_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_url() {
        let client = SidewalkClient::new(SidewalkConfig::new("http://example.org/"));

        assert_eq!(
            client.labels_url(
                12,
                &LabelSource::GroundTruth {
                    hit_id: "3XJ9".to_string()
                }
            ),
            "http://example.org/labelsToCluster/12/3XJ9"
        );
        assert_eq!(
            client.labels_url(12, &LabelSource::Crowd { n_labelers: 5 }),
            "http://example.org/nonGTLabelsToCluster/12/5"
        );
    }

    #[test]
    fn test_results_url() {
        let client = SidewalkClient::new(SidewalkConfig::default());
        assert_eq!(
            client.results_url(7, 0.0075),
            "http://localhost:9000/clusteringResults/7/0.0075"
        );
    }

    #[test]
    fn test_source_majority_policy() {
        let gt = LabelSource::GroundTruth {
            hit_id: "H".to_string(),
        };
        assert_eq!(gt.majority_policy().threshold(), 2);
        assert_eq!(
            LabelSource::Crowd { n_labelers: 7 }.majority_policy().threshold(),
            4
        );
    }
}
