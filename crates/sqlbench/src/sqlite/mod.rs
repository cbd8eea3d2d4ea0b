use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaColumn {
    pub name: String,
    pub declared_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaTable {
    pub name: String,
    pub columns: Vec<SchemaColumn>,
}

/// Result of running one model-generated statement.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Rows {
        headers: Vec<String>,
        rows: Vec<Vec<SqlValue>>,
    },
    /// Statement ran but produced no result set (DDL/DML).
    Statement,
    Failed {
        error: String,
    },
}

impl QueryOutcome {
    #[must_use]
    pub fn headers(&self) -> &[String] {
        match self {
            Self::Rows { headers, .. } => headers.as_slice(),
            Self::Statement | Self::Failed { .. } => &[],
        }
    }

    /// `None` is the execution-failure sentinel; a statement without a
    /// result set reports an empty row list.
    #[must_use]
    pub fn rows(&self) -> Option<&[Vec<SqlValue>]> {
        match self {
            Self::Rows { rows, .. } => Some(rows.as_slice()),
            Self::Statement => Some([].as_slice()),
            Self::Failed { .. } => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { error } => Some(error),
            Self::Rows { .. } | Self::Statement => None,
        }
    }
}

/// Reference database handle. The connection is opened once per run and
/// closed when the handle is dropped.
#[derive(Debug)]
pub struct SqliteDatabase {
    connection: Connection,
}

pub fn open_sqlite_connection(path: &Path) -> Result<Connection> {
    if !path.is_file() {
        bail!("sqlite database not found: {}", path.display());
    }

    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open sqlite database: {}", path.display()))
}

impl SqliteDatabase {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_connection(open_sqlite_connection(path)?))
    }

    #[must_use]
    pub fn from_connection(connection: Connection) -> Self {
        Self { connection }
    }

    pub fn load_schema_tables(&self) -> Result<Vec<SchemaTable>> {
        let mut statement = self
            .connection
            .prepare(
                "SELECT name
                 FROM sqlite_schema
                 WHERE type = 'table'
                 ORDER BY name ASC",
            )
            .context("failed to prepare sqlite_schema introspection query")?;

        let table_rows = statement
            .query_map([], |row| row.get::<usize, String>(0))
            .context("failed to execute sqlite_schema introspection query")?;

        let mut tables = Vec::new();
        for row in table_rows {
            let name = row.context("failed to decode sqlite_schema row")?;
            if is_internal_table(&name) {
                continue;
            }
            let columns = self.load_schema_columns(&name)?;
            tables.push(SchemaTable { name, columns });
        }

        Ok(tables)
    }

    fn load_schema_columns(&self, table_name: &str) -> Result<Vec<SchemaColumn>> {
        let pragma_sql = format!("PRAGMA table_info({})", sqlite_single_quoted(table_name));
        let mut statement = self
            .connection
            .prepare(&pragma_sql)
            .with_context(|| format!("failed to prepare column introspection for `{table_name}`"))?;

        let column_rows = statement
            .query_map([], |row| {
                Ok(SchemaColumn {
                    name: row.get::<usize, String>(1)?,
                    declared_type: row.get::<usize, Option<String>>(2)?,
                })
            })
            .with_context(|| format!("failed to execute column introspection for `{table_name}`"))?;

        column_rows
            .map(|row| row.context("failed to decode schema column row"))
            .collect()
    }

    /// Human-readable listing of every table and its declared column types.
    pub fn get_schema(&self) -> Result<String> {
        let tables = self.load_schema_tables()?;
        Ok(render_schema(&tables))
    }

    /// Runs a statement and converts every failure into
    /// [`QueryOutcome::Failed`].
    #[must_use]
    pub fn execute_query(&self, sql: &str) -> QueryOutcome {
        match self.try_execute_query(sql) {
            Ok(outcome) => outcome,
            Err(error) => QueryOutcome::Failed {
                error: format!("{error:#}"),
            },
        }
    }

    fn try_execute_query(&self, sql: &str) -> Result<QueryOutcome> {
        if sql.trim().is_empty() {
            bail!("SQL query is empty");
        }

        let mut statement = self
            .connection
            .prepare(sql)
            .context("failed to prepare query")?;
        if statement.column_count() == 0 {
            statement.execute([]).context("failed to execute statement")?;
            return Ok(QueryOutcome::Statement);
        }

        let headers = statement
            .column_names()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        let column_count = headers.len();

        let mut rows = statement.query([]).context("failed to execute query")?;
        let mut result_rows = Vec::new();
        while let Some(row) = rows.next().context("failed to fetch query row")? {
            let mut values = Vec::with_capacity(column_count);
            for index in 0..column_count {
                values.push(
                    row.get::<usize, SqlValue>(index)
                        .context("failed to decode query column")?,
                );
            }
            result_rows.push(values);
        }

        Ok(QueryOutcome::Rows {
            headers,
            rows: result_rows,
        })
    }
}

#[must_use]
pub fn render_schema(tables: &[SchemaTable]) -> String {
    let mut lines = Vec::new();
    for table in tables {
        lines.push(format!("Table: {}", table.name));
        for column in &table.columns {
            lines.push(format!(
                "  - {} ({})",
                column.name,
                column.declared_type.as_deref().unwrap_or_default()
            ));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

fn is_internal_table(name: &str) -> bool {
    name.starts_with("sqlite_")
}

fn sqlite_single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
