//! Row normalization and recall scoring.
//!
//! Ground-truth rows arrive as JSON objects while model output arrives as
//! positional SQLite values plus column headers. Both sides are reduced to a
//! [`NormalizedRow`] before comparison: keys and values are lowercased, values
//! are rendered as text and trimmed, and pairs are sorted by key.

use std::collections::{BTreeMap, BTreeSet};

use rusqlite::types::Value as SqlValue;
use serde::Serialize;
use serde_json::Value;

/// A ground-truth row keyed by column name.
pub type Row = serde_json::Map<String, Value>;

/// Text rendering of a single result cell.
pub trait CellText {
    fn cell_text(&self) -> String;
}

impl CellText for Value {
    fn cell_text(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Number(number) => {
                if let Some(integer) = number.as_i64() {
                    integer.to_string()
                } else if let Some(unsigned) = number.as_u64() {
                    unsigned.to_string()
                } else {
                    number.as_f64().map_or_else(|| number.to_string(), format_real)
                }
            }
            Value::String(text) => text.clone(),
            Value::Array(_) | Value::Object(_) => self.to_string(),
        }
    }
}

impl CellText for SqlValue {
    fn cell_text(&self) -> String {
        match self {
            SqlValue::Null => "null".to_string(),
            SqlValue::Integer(value) => value.to_string(),
            SqlValue::Real(value) => format_real(*value),
            SqlValue::Text(value) => value.clone(),
            SqlValue::Blob(value) => crate::utils::encode_blob_hex(value),
        }
    }
}

impl CellText for str {
    fn cell_text(&self) -> String {
        self.to_string()
    }
}

impl CellText for String {
    fn cell_text(&self) -> String {
        self.clone()
    }
}

impl CellText for i64 {
    fn cell_text(&self) -> String {
        self.to_string()
    }
}

impl CellText for f64 {
    fn cell_text(&self) -> String {
        format_real(*self)
    }
}

impl<T: CellText + ?Sized> CellText for &T {
    fn cell_text(&self) -> String {
        (**self).cell_text()
    }
}

// Integral reals keep a trailing `.0` so `2.0` and `2` stay distinct.
fn format_real(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Canonical, hashable form of a row: `(lowercased_key, folded_text)` pairs
/// sorted by key then value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NormalizedRow(Vec<(String, String)>);

impl NormalizedRow {
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

pub fn normalize_row<I, K, V>(row: I) -> NormalizedRow
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: CellText,
{
    let mut pairs = row
        .into_iter()
        .map(|(key, value)| {
            (
                key.as_ref().to_lowercase(),
                value.cell_text().trim().to_lowercase(),
            )
        })
        .collect::<Vec<_>>();
    pairs.sort();
    NormalizedRow(pairs)
}

/// Builds the column mapping for a positional row. Repeated header names keep
/// the last value.
fn normalize_positional<V: CellText>(headers: &[String], values: &[V]) -> NormalizedRow {
    let mut mapped: BTreeMap<&str, &V> = BTreeMap::new();
    for (header, value) in headers.iter().zip(values) {
        mapped.insert(header.as_str(), value);
    }
    normalize_row(mapped)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreResult {
    pub percentage: f64,
    pub matched_count: usize,
    pub expected_count: usize,
}

impl ScoreResult {
    #[must_use]
    pub const fn new(percentage: f64, matched_count: usize, expected_count: usize) -> Self {
        Self {
            percentage,
            matched_count,
            expected_count,
        }
    }

    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.percentage >= 100.0
    }
}

/// Recall of the distinct expected rows within the actual result set.
///
/// `actual` is `None` when the query failed to execute; with nothing
/// expected that still counts as a full match. Actual rows whose
/// value count differs from `actual_headers.len()` are ignored. Extra actual
/// rows never lower the score unless no rows were expected at all.
pub fn score<V: CellText>(
    expected: &[Row],
    actual: Option<&[Vec<V>]>,
    actual_headers: &[String],
) -> ScoreResult {
    if expected.is_empty() {
        return match actual {
            None | Some([]) => ScoreResult::new(100.0, 0, 0),
            Some(_) => ScoreResult::new(0.0, 0, 0),
        };
    }

    let expected_set = expected.iter().map(normalize_row).collect::<BTreeSet<_>>();
    let Some(actual_rows) = actual else {
        return ScoreResult::new(0.0, 0, expected_set.len());
    };

    let actual_set = actual_rows
        .iter()
        .filter(|values| values.len() == actual_headers.len())
        .map(|values| normalize_positional(actual_headers, values))
        .collect::<BTreeSet<_>>();

    let matched_count = expected_set.intersection(&actual_set).count();
    let expected_count = expected_set.len();
    let percentage = matched_count as f64 / expected_count as f64 * 100.0;

    ScoreResult::new(percentage, matched_count, expected_count)
}
