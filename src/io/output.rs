use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::models::{OutputRecord, TypeSummary};
use crate::stages::PipelineOutput;

/// Serialize the cluster assignment table as the JSON array the result
/// endpoint consumes
pub fn records_to_json(records: &[OutputRecord]) -> Result<String> {
    serde_json::to_string(records).context("Failed to serialize cluster records")
}

/// Write the cluster assignment table to a JSON file
pub fn write_records(records: &[OutputRecord], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    serde_json::to_writer_pretty(file, records).context("Failed to write JSON")?;
    Ok(())
}

/// Human-readable per-type report of a pipeline run
pub struct RunReport<'a> {
    output: &'a PipelineOutput,
}

impl<'a> RunReport<'a> {
    pub fn new(output: &'a PipelineOutput) -> Self {
        Self { output }
    }

    /// Format the report as aligned text
    pub fn format(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!(
            "{:<16} {:>8} {:>8} {:>9} {:>9}\n",
            "type", "labels", "clusters", "accepted", "disputed"
        ));

        for summary in &self.output.summaries {
            report.push_str(&format_summary(summary));
        }

        report.push_str(&format!(
            "\n{} rows, {} labels awaiting review\n",
            self.output.records.len(),
            self.output.disputed_label_ids.len()
        ));
        report
    }

    /// Write to a text file
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        write!(file, "{}", self.format())?;
        Ok(())
    }
}

fn format_summary(summary: &TypeSummary) -> String {
    format!(
        "{:<16} {:>8} {:>8} {:>9} {:>9}\n",
        summary.label_type.as_str(),
        summary.label_count,
        summary.cluster_count,
        summary.accepted_count,
        summary.disputed_count
    )
}
