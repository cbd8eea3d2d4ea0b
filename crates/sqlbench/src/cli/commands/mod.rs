pub mod models;
pub mod report_schema;
pub mod run;
pub mod schema;
