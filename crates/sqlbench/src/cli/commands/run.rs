use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use clap::Args;

use crate::bench::{BenchmarkEvent, BenchmarkPlan, DEFAULT_INTER_REQUEST_DELAY};
use crate::config::RuntimePaths;
use crate::prompt::{PromptOptions, PromptTechnique};
use crate::providers::http::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::providers::{HttpChatInvoker, ProviderRegistry};
use crate::registry::ModelGroup;
use crate::scoring::ScoreResult;
use crate::sqlite::SqliteDatabase;
use crate::utils::redaction::redact_credentials_text;

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[arg(long, value_enum, default_value_t = ModelGroup::All)]
    pub group: ModelGroup,

    #[arg(long, value_enum, default_value_t = PromptTechnique::ZeroShot)]
    pub prompt_technique: PromptTechnique,

    /// Send only the schema, without the instructional prompt.
    #[arg(long, default_value_t = false)]
    pub no_system_prompt: bool,

    /// Targets are not reasoning models; prefixes the prompt with `/no_think`.
    #[arg(long, default_value_t = false)]
    pub no_reasoning: bool,

    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_INTER_REQUEST_DELAY.as_secs())]
    pub delay_secs: u64,

    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

impl RunArgs {
    #[must_use]
    pub fn prompt_options(&self) -> PromptOptions {
        PromptOptions {
            use_system_prompt: !self.no_system_prompt,
            reasoning: !self.no_reasoning,
            technique: self.prompt_technique,
        }
    }
}

pub fn run(args: &RunArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    let options = args.prompt_options();
    println!(
        "run: start group={} technique={} system_prompt={} reasoning={} db={} cases={} out_dir={}",
        args.group,
        options.technique,
        options.use_system_prompt,
        options.reasoning,
        runtime_paths.db_path.display(),
        runtime_paths.cases_path.display(),
        runtime_paths.out_dir.display()
    );

    let registry = super::models::load_registry(runtime_paths)?;
    let providers = ProviderRegistry::from_env();
    let active_models = crate::registry::select_active_models(&registry, args.group, &providers);
    if active_models.is_empty() {
        println!(
            "run: no available models for group `{}`; nothing to do",
            args.group
        );
        return Ok(());
    }

    let cases = crate::models::load_test_cases(&runtime_paths.cases_path)?;
    if cases.is_empty() {
        println!(
            "run: no test cases in {}; nothing to do",
            runtime_paths.cases_path.display()
        );
        return Ok(());
    }

    let database = SqliteDatabase::open(&runtime_paths.db_path)?;
    let schema = database.get_schema()?;
    println!(
        "run: checkpoint schema_loaded cases={} models={}",
        cases.len(),
        active_models.len()
    );

    let plan = BenchmarkPlan::new(crate::prompt::build_system_prompt(&schema, &options))
        .with_delay(Duration::from_secs(args.delay_secs));
    let invoker = HttpChatInvoker::new(providers, Duration::from_secs(args.timeout_secs));
    let benchmark = crate::bench::run_benchmark(
        &cases,
        &active_models,
        &invoker,
        &database,
        &plan,
        print_progress,
    );
    drop(database);
    println!(
        "run: checkpoint benchmark_complete records={}",
        benchmark.records.len()
    );

    let metadata = crate::report::ReportMetadata::new(
        args.group,
        options.technique,
        options.use_system_prompt,
        cases.len(),
    );
    let report = crate::report::build_report(metadata, benchmark);
    let artifact_path = crate::report::report_artifact_path(
        &runtime_paths.out_dir,
        args.group,
        options.technique,
    );
    match crate::report::write_report_artifact(&artifact_path, &report) {
        Ok(()) => println!(
            "run: checkpoint report_written path={}",
            artifact_path.display()
        ),
        Err(error) => eprintln!(
            "run: report_write_failed path={} error={}",
            artifact_path.display(),
            redact_credentials_text(&format!("{error:#}"))
        ),
    }

    println!();
    println!(
        "{}",
        crate::report::render_summary_table(&report.summary.model_performance)
    );
    Ok(())
}

fn print_progress(event: BenchmarkEvent<'_>) {
    match event {
        BenchmarkEvent::CaseStarted { position, case } => {
            println!("{0} Test Case {1}: {2} {0}", "=".repeat(10), position + 1, case.id);
            println!("Q: {}", case.question);
            println!("Expected Rows: {}", case.ground_truth_results.len());
        }
        BenchmarkEvent::ModelStarted { model } => {
            print!("  > Model: {}... ", model.name);
            let _ = std::io::stdout().flush();
        }
        BenchmarkEvent::ModelFinished {
            score,
            record,
            invocation_failed,
            ..
        } => {
            if invocation_failed {
                print!(" [Err: {}]", record.error.as_deref().unwrap_or_default());
            }
            println!(
                "{} Score: {:.1}% ({}/{}) - {:.2}s",
                status_icon(&score),
                score.percentage,
                score.matched_count,
                score.expected_count,
                record.latency_seconds
            );
        }
    }
}

fn status_icon(score: &ScoreResult) -> &'static str {
    if score.is_perfect() {
        "✅"
    } else if score.percentage > 0.0 {
        "⚠️"
    } else {
        "❌"
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::status_icon;
    use crate::cli::app::{Cli, Command};
    use crate::prompt::PromptTechnique;
    use crate::registry::ModelGroup;
    use crate::scoring::ScoreResult;

    #[test]
    fn run_flags_default_to_instructional_reasoning_zero_shot() {
        let cli = Cli::try_parse_from(["sqlbench", "run"]).expect("run should parse");
        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.group, ModelGroup::All);
        assert_eq!(args.delay_secs, 5);
        assert_eq!(args.timeout_secs, 40);
        let options = args.prompt_options();
        assert!(options.use_system_prompt);
        assert!(options.reasoning);
        assert_eq!(options.technique, PromptTechnique::ZeroShot);
    }

    #[test]
    fn run_flags_parse_composite_group_and_toggles() {
        let cli = Cli::try_parse_from([
            "sqlbench",
            "run",
            "--group",
            "large-opensource",
            "--prompt-technique",
            "few-shot",
            "--no-system-prompt",
            "--no-reasoning",
            "--delay-secs",
            "0",
        ])
        .expect("run flags should parse");
        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.group, ModelGroup::LargeOpensource);
        let options = args.prompt_options();
        assert!(!options.use_system_prompt);
        assert!(!options.reasoning);
        assert_eq!(options.technique, PromptTechnique::FewShot);
        assert_eq!(args.delay_secs, 0);
    }

    #[test]
    fn unknown_group_is_rejected() {
        assert!(Cli::try_parse_from(["sqlbench", "run", "--group", "tiny"]).is_err());
    }

    #[test]
    fn status_icons_follow_score_bands() {
        assert_eq!(status_icon(&ScoreResult::new(100.0, 2, 2)), "✅");
        assert_eq!(status_icon(&ScoreResult::new(100.0, 0, 0)), "✅");
        assert_eq!(status_icon(&ScoreResult::new(50.0, 1, 2)), "⚠️");
        assert_eq!(status_icon(&ScoreResult::new(0.0, 0, 2)), "❌");
    }
}
