#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use clap::error::ErrorKind;
use sqlbench::cli::app::{Cli, Command, RuntimeArgs};
use sqlbench::cli::commands;
use sqlbench::config::RuntimePaths;

const EXIT_SUCCESS: i32 = 0;
const EXIT_RUNTIME_FAILURE: i32 = 1;
const EXIT_USAGE_ERROR: i32 = 64;

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => return exit_code_for_parse_error(error),
    };
    let _ = dotenvy::dotenv();
    let command_name = command_name(&cli.command);
    println!("sqlbench: starting `{command_name}`");

    match execute(cli) {
        Ok(()) => {
            println!("sqlbench: completed `{command_name}` (exit_code={EXIT_SUCCESS})");
            EXIT_SUCCESS
        }
        Err(error) => {
            eprintln!("sqlbench: failed `{command_name}` (exit_code={EXIT_RUNTIME_FAILURE})");
            eprintln!(
                "{}",
                sqlbench::utils::redaction::redact_credentials_text(&format!("{error:#}"))
            );
            EXIT_RUNTIME_FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => {
            let runtime_paths = resolve_runtime_paths(&cli.runtime)?;
            commands::run::run(&args, &runtime_paths)
        }
        Command::Schema => {
            let runtime_paths = resolve_runtime_paths(&cli.runtime)?;
            commands::schema::run(&runtime_paths)
        }
        Command::Models(args) => {
            let runtime_paths = resolve_runtime_paths(&cli.runtime)?;
            commands::models::run(&args, &runtime_paths)
        }
        Command::ReportSchema => commands::report_schema::run(),
    }
}

fn exit_code_for_parse_error(error: clap::Error) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = error.print();
            EXIT_SUCCESS
        }
        _ => {
            let _ = error.print();
            EXIT_USAGE_ERROR
        }
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Run(_) => "run",
        Command::Schema => "schema",
        Command::Models(_) => "models",
        Command::ReportSchema => "report-schema",
    }
}

fn resolve_runtime_paths(args: &RuntimeArgs) -> Result<RuntimePaths> {
    let home_dir = match &args.home_dir {
        Some(path) => path.clone(),
        None => std::env::var_os("HOME")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("HOME is not set; pass --home-dir"))?,
    };

    let cwd = match &args.cwd {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };

    sqlbench::config::resolve_runtime_paths(&home_dir, &cwd, &args.path_overrides())
}
