//! Sequential benchmark loop: every test case against every active model.

use std::time::{Duration, Instant};

use crate::models::{ResultRecord, TestCase};
use crate::prompt::build_user_prompt;
use crate::providers::ModelInvoker;
use crate::registry::ModelSpec;
use crate::scoring::{ScoreResult, score};
use crate::sqlite::{QueryOutcome, SqliteDatabase};
use crate::utils::redaction::redact_credentials_text;
use crate::utils::time::now_utc_timestamp;

pub const DEFAULT_INTER_REQUEST_DELAY: Duration = Duration::from_secs(5);

const FENCE_SQL_OPEN: &str = "```sql";
const FENCE: &str = "```";

/// Strips one leading and one trailing Markdown code fence, then trims.
#[must_use]
pub fn sanitize_generated_sql(raw: &str) -> String {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix(FENCE_SQL_OPEN) {
        text = rest;
    } else if let Some(rest) = text.strip_prefix(FENCE) {
        text = rest;
    }
    text = text.trim();
    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest;
    }
    text.trim().to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelRunningStats {
    pub model_name: String,
    pub total_score_sum: f64,
    pub queries_run: usize,
}

impl ModelRunningStats {
    #[must_use]
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            total_score_sum: 0.0,
            queries_run: 0,
        }
    }

    pub fn record(&mut self, percentage: f64) {
        self.total_score_sum += percentage;
        self.queries_run += 1;
    }

    #[must_use]
    pub fn average_accuracy(&self) -> f64 {
        if self.queries_run == 0 {
            0.0
        } else {
            self.total_score_sum / self.queries_run as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkPlan {
    pub system_prompt: String,
    pub inter_request_delay: Duration,
}

impl BenchmarkPlan {
    #[must_use]
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            inter_request_delay: DEFAULT_INTER_REQUEST_DELAY,
        }
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.inter_request_delay = delay;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkRun {
    pub records: Vec<ResultRecord>,
    /// One entry per active model, in registration order.
    pub stats: Vec<ModelRunningStats>,
}

/// Progress notifications emitted while the loop runs.
#[derive(Debug)]
pub enum BenchmarkEvent<'a> {
    CaseStarted {
        position: usize,
        case: &'a TestCase,
    },
    ModelStarted {
        model: &'a ModelSpec,
    },
    ModelFinished {
        model: &'a ModelSpec,
        score: ScoreResult,
        record: &'a ResultRecord,
        invocation_failed: bool,
    },
}

pub fn run_benchmark(
    cases: &[TestCase],
    models: &[ModelSpec],
    invoker: &dyn ModelInvoker,
    database: &SqliteDatabase,
    plan: &BenchmarkPlan,
    mut on_event: impl FnMut(BenchmarkEvent<'_>),
) -> BenchmarkRun {
    let mut records = Vec::with_capacity(cases.len() * models.len());
    let mut stats = models
        .iter()
        .map(|model| ModelRunningStats::new(model.name.clone()))
        .collect::<Vec<_>>();

    for (position, case) in cases.iter().enumerate() {
        on_event(BenchmarkEvent::CaseStarted { position, case });
        let user_prompt = build_user_prompt(&case.question);

        for (model, model_stats) in models.iter().zip(stats.iter_mut()) {
            on_event(BenchmarkEvent::ModelStarted { model });

            let execution = execute_pair(case, model, invoker, database, plan, &user_prompt);
            model_stats.record(execution.score.percentage);
            records.push(execution.record);

            if let Some(record) = records.last() {
                on_event(BenchmarkEvent::ModelFinished {
                    model,
                    score: execution.score,
                    record,
                    invocation_failed: execution.invocation_failed,
                });
            }

            if !plan.inter_request_delay.is_zero() {
                std::thread::sleep(plan.inter_request_delay);
            }
        }
    }

    BenchmarkRun { records, stats }
}

struct PairExecution {
    score: ScoreResult,
    record: ResultRecord,
    invocation_failed: bool,
}

fn execute_pair(
    case: &TestCase,
    model: &ModelSpec,
    invoker: &dyn ModelInvoker,
    database: &SqliteDatabase,
    plan: &BenchmarkPlan,
    user_prompt: &str,
) -> PairExecution {
    let started = Instant::now();
    let (generated_sql, outcome, invocation_error) =
        match invoker.invoke(model, &plan.system_prompt, user_prompt) {
            Ok(raw) => {
                let sql = sanitize_generated_sql(&raw);
                let outcome = database.execute_query(&sql);
                (sql, Some(outcome), None)
            }
            Err(error) => (String::new(), None, Some(error.to_string())),
        };
    let latency_seconds = started.elapsed().as_secs_f64();

    let score = match &outcome {
        Some(outcome) => score(
            &case.ground_truth_results,
            outcome.rows(),
            outcome.headers(),
        ),
        None => score::<rusqlite::types::Value>(&case.ground_truth_results, None, &[]),
    };

    let invocation_failed = invocation_error.is_some();
    let error = invocation_error
        .or_else(|| {
            outcome
                .as_ref()
                .and_then(QueryOutcome::error)
                .map(ToString::to_string)
        })
        .map(|message| redact_credentials_text(&message));

    PairExecution {
        score,
        record: ResultRecord {
            timestamp: now_utc_timestamp(),
            query_id: case.id.clone(),
            model_name: model.name.clone(),
            difficulty: case.difficulty.clone(),
            match_percentage: score.percentage,
            rows_matched: score.matched_count,
            rows_expected: score.expected_count,
            latency_seconds,
            generated_sql,
            error,
        },
        invocation_failed,
    }
}
