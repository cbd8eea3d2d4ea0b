use anyhow::{Context, Result};

pub fn run() -> Result<()> {
    let schema = crate::report::report_json_schema();
    let encoded =
        serde_json::to_string_pretty(&schema).context("failed to encode report schema json")?;
    println!("{encoded}");
    Ok(())
}
