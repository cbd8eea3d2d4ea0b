#![forbid(unsafe_code)]

pub mod bench;
pub mod cli;
pub mod config;
pub mod models;
pub mod prompt;
pub mod providers;
pub mod registry;
pub mod report;
pub mod scoring;
pub mod sqlite;
pub mod utils;

pub use cli::app::{Cli, Command};
