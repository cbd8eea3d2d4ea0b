use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::scoring::Row;

/// A natural-language question with its known-correct result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCase {
    pub id: String,
    pub question: String,
    pub difficulty: Option<String>,
    pub ground_truth_results: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct TestCaseEntry {
    #[serde(default)]
    id: Option<String>,
    question: String,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    ground_truth_results: Vec<Row>,
}

impl TestCase {
    fn from_entry(index: usize, entry: TestCaseEntry) -> Self {
        Self {
            id: entry.id.unwrap_or_else(|| format!("q_{index}")),
            question: entry.question,
            difficulty: entry.difficulty,
            ground_truth_results: entry.ground_truth_results,
        }
    }
}

pub fn load_test_cases(path: &Path) -> Result<Vec<TestCase>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read test cases: {}", path.display()))?;
    parse_test_cases(&raw).with_context(|| format!("invalid test cases file: {}", path.display()))
}

pub fn parse_test_cases(raw: &str) -> Result<Vec<TestCase>> {
    let entries: Vec<TestCaseEntry> =
        serde_json::from_str(raw).context("test cases must be a JSON array of objects")?;
    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| TestCase::from_entry(index, entry))
        .collect())
}
