use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One (test case, model) execution in the detailed report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResultRecord {
    pub timestamp: String,
    pub query_id: String,
    #[serde(rename = "model")]
    pub model_name: String,
    pub difficulty: Option<String>,
    pub match_percentage: f64,
    pub rows_matched: usize,
    pub rows_expected: usize,
    #[serde(rename = "latency")]
    pub latency_seconds: f64,
    pub generated_sql: String,
    pub error: Option<String>,
}
