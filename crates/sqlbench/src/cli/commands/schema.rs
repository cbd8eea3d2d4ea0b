use anyhow::Result;

use crate::config::RuntimePaths;
use crate::sqlite::SqliteDatabase;

pub fn run(runtime_paths: &RuntimePaths) -> Result<()> {
    let database = SqliteDatabase::open(&runtime_paths.db_path)?;
    let tables = database.load_schema_tables()?;
    println!(
        "schema: loaded db={} tables={}",
        runtime_paths.db_path.display(),
        tables.len()
    );
    println!("{}", crate::sqlite::render_schema(&tables));
    Ok(())
}
