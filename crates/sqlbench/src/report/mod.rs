use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bench::{BenchmarkRun, ModelRunningStats};
use crate::models::ResultRecord;
use crate::prompt::PromptTechnique;
use crate::registry::ModelGroup;
use crate::utils::time::now_utc_timestamp;

const TABLE_RULE_WIDTH: usize = 50;
const TABLE_HEADER_RULE_WIDTH: usize = 55;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelPerformance {
    pub model_name: String,
    pub average_accuracy: f64,
    pub queries_completed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReportMetadata {
    pub timestamp_utc: String,
    pub model_group: String,
    pub total_queries_run: usize,
    pub prompt_technique: String,
    pub system_prompt_used: bool,
}

impl ReportMetadata {
    #[must_use]
    pub fn new(
        group: ModelGroup,
        technique: PromptTechnique,
        system_prompt_used: bool,
        total_queries_run: usize,
    ) -> Self {
        Self {
            timestamp_utc: now_utc_timestamp(),
            model_group: group.as_str().to_string(),
            total_queries_run,
            prompt_technique: technique.as_str().to_string(),
            system_prompt_used,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportSummary {
    pub metadata: ReportMetadata,
    pub model_performance: Vec<ModelPerformance>,
}

/// The persisted artifact of one (model group, prompt technique) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BenchmarkReport {
    pub summary: ReportSummary,
    pub detailed_report: Vec<ResultRecord>,
}

#[must_use]
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-model averages sorted best first. Ties keep registration order.
#[must_use]
pub fn build_model_performance(stats: &[ModelRunningStats]) -> Vec<ModelPerformance> {
    let mut performance = stats
        .iter()
        .map(|entry| ModelPerformance {
            model_name: entry.model_name.clone(),
            average_accuracy: round_to_hundredths(entry.average_accuracy()),
            queries_completed: entry.queries_run,
        })
        .collect::<Vec<_>>();
    performance.sort_by(|left, right| right.average_accuracy.total_cmp(&left.average_accuracy));
    performance
}

#[must_use]
pub fn build_report(metadata: ReportMetadata, run: BenchmarkRun) -> BenchmarkReport {
    BenchmarkReport {
        summary: ReportSummary {
            metadata,
            model_performance: build_model_performance(&run.stats),
        },
        detailed_report: run.records,
    }
}

#[must_use]
pub fn report_artifact_path(
    out_dir: &Path,
    group: ModelGroup,
    technique: PromptTechnique,
) -> PathBuf {
    out_dir.join(format!(
        "benchmark_{}_{}.json",
        group.as_str(),
        technique.as_str()
    ))
}

pub fn write_report_artifact(path: &Path, report: &BenchmarkReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("failed to create report directory")?;
    }

    let encoded = serde_json::to_vec_pretty(report).context("failed to encode report json")?;
    std::fs::write(path, encoded)
        .with_context(|| format!("failed to write report artifact: {}", path.display()))
}

/// Fixed-width console table of the sorted summary.
#[must_use]
pub fn render_summary_table(performance: &[ModelPerformance]) -> String {
    let rule = "#".repeat(TABLE_RULE_WIDTH);
    let mut lines = vec![
        rule.clone(),
        "           BENCHMARK SUMMARY".to_string(),
        rule.clone(),
        format!("{:<25} | {:<15} | {}", "Model Name", "Avg Accuracy", "Queries"),
        "-".repeat(TABLE_HEADER_RULE_WIDTH),
    ];
    for entry in performance {
        lines.push(format!(
            "{:<25} | {:.2}%{:11} | {}",
            entry.model_name, entry.average_accuracy, "", entry.queries_completed
        ));
    }
    lines.push(rule);
    lines.join("\n")
}

pub fn report_json_schema() -> Value {
    let schema = schemars::schema_for!(BenchmarkReport);
    match serde_json::to_value(schema) {
        Ok(value) => value,
        Err(error) => {
            panic!("failed to serialize generated report schema: {error}");
        }
    }
}
