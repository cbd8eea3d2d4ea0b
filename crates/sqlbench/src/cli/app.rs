use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::commands::{models::ModelsArgs, run::RunArgs};
use crate::config::PathOverrides;

#[derive(Debug, Parser)]
#[command(
    name = "sqlbench",
    version,
    about = "Natural-language-to-SQL benchmark across LLM providers"
)]
pub struct Cli {
    #[command(flatten)]
    pub runtime: RuntimeArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct RuntimeArgs {
    #[arg(long, global = true, value_name = "PATH")]
    pub home_dir: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub cwd: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub out_dir: Option<PathBuf>,

    /// Reference SQLite database.
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// JSON array of test cases.
    #[arg(long, global = true, value_name = "PATH")]
    pub cases: Option<PathBuf>,

    /// JSON model registry replacing the built-in one.
    #[arg(long, global = true, value_name = "PATH")]
    pub models_file: Option<PathBuf>,
}

impl RuntimeArgs {
    #[must_use]
    pub fn path_overrides(&self) -> PathOverrides<'_> {
        PathOverrides {
            out_dir: self.out_dir.as_deref(),
            db_path: self.db.as_deref(),
            cases_path: self.cases.as_deref(),
            models_file: self.models_file.as_deref(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run every test case against every active model.
    Run(RunArgs),
    /// Print the schema listing sent to the models.
    Schema,
    /// List registry entries and whether they would run.
    Models(ModelsArgs),
    /// Print the JSON Schema of the report artifact.
    ReportSchema,
}
