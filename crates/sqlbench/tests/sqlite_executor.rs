use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::Connection;
use rusqlite::types::Value as SqlValue;
use sqlbench::sqlite::{QueryOutcome, SqliteDatabase};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}-{nanos}"))
}

fn create_library_db(path: &std::path::Path) {
    let connection = Connection::open(path).expect("fixture db should open");
    connection
        .execute_batch(
            "CREATE TABLE members (id INTEGER PRIMARY KEY, name TEXT NOT NULL, joined DATE);
             CREATE TABLE loans (id INTEGER PRIMARY KEY, member_id INTEGER REFERENCES members(id), returned_at TEXT);
             INSERT INTO members (name, joined) VALUES ('Ana', '2024-01-02'), ('Luis', '2024-03-04');
             INSERT INTO loans (member_id, returned_at) VALUES (1, NULL), (2, '2024-05-01');",
        )
        .expect("fixture schema should apply");
}

#[test]
fn opening_a_missing_database_fails_without_creating_it() {
    let temp = unique_temp_dir("sqlbench-sqlite-missing");
    let path = temp.join("absent.db");

    let error = SqliteDatabase::open(&path).expect_err("missing db must fail");
    assert!(
        error.to_string().contains("sqlite database not found"),
        "unexpected error: {error}"
    );
    assert!(!path.exists());
}

#[test]
fn schema_and_queries_run_against_file_database() {
    let temp = unique_temp_dir("sqlbench-sqlite-file");
    std::fs::create_dir_all(&temp).expect("temp dir should be creatable");
    let path = temp.join("library.db");
    create_library_db(&path);

    let database = SqliteDatabase::open(&path).expect("db should open");
    let schema = database.get_schema().expect("schema should load");
    assert!(schema.contains("Table: loans\n  - id (INTEGER)\n  - member_id (INTEGER)\n  - returned_at (TEXT)\n"));
    assert!(schema.contains("Table: members\n  - id (INTEGER)\n  - name (TEXT)\n  - joined (DATE)\n"));
    assert!(schema.find("Table: loans") < schema.find("Table: members"));

    let outcome = database.execute_query(
        "SELECT m.name AS member, l.returned_at FROM loans l JOIN members m ON m.id = l.member_id ORDER BY l.id",
    );
    assert_eq!(outcome.headers(), &["member".to_string(), "returned_at".to_string()]);
    assert_eq!(
        outcome.rows().expect("join should succeed"),
        &[
            vec![SqlValue::Text("Ana".to_string()), SqlValue::Null],
            vec![
                SqlValue::Text("Luis".to_string()),
                SqlValue::Text("2024-05-01".to_string())
            ],
        ]
    );
}

#[test]
fn modifications_persist_on_the_shared_connection() {
    let temp = unique_temp_dir("sqlbench-sqlite-mutation");
    std::fs::create_dir_all(&temp).expect("temp dir should be creatable");
    let path = temp.join("library.db");
    create_library_db(&path);

    let database = SqliteDatabase::open(&path).expect("db should open");
    assert_eq!(
        database.execute_query("UPDATE members SET name = 'Ana María' WHERE id = 1"),
        QueryOutcome::Statement
    );
    drop(database);

    let reopened = SqliteDatabase::open(&path).expect("db should reopen");
    let outcome = reopened.execute_query("SELECT name FROM members WHERE id = 1");
    assert_eq!(
        outcome.rows().expect("select should succeed"),
        &[vec![SqlValue::Text("Ana María".to_string())]]
    );
}

#[test]
fn syntax_errors_are_reported_not_raised() {
    let database = SqliteDatabase::from_connection(
        Connection::open_in_memory().expect("in-memory sqlite should open"),
    );
    let outcome = database.execute_query("SELEC name FROM members");
    assert!(matches!(outcome, QueryOutcome::Failed { .. }));
    assert!(outcome.rows().is_none());
}
