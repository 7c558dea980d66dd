//! Decoding of the estimator's tabular report.
//!
//! The estimator prints a header starting with `Method` followed by one
//! tab-separated row per algorithm:
//!
//! ```text
//! Method  Updates/ms  Space  Recall  5th  95th  Precis  5th  95th  Freq RE  5th  95th
//! ```
//!
//! Only the first two numeric columns are required. Row identity comes from
//! the caller's [`RowMapping`], never from the row labels.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::bench::mapping::RowMapping;
use crate::error::ReportError;

pub const REPORT_MARKER: &str = "Method";

const UPDATES_COLUMN: usize = 1;
const SPACE_COLUMN: usize = 2;
const ACCURACY_COLUMNS: std::ops::Range<usize> = 3..12;

/// Mean with its 5th and 95th percentile bounds, as printed by the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub mean: f64,
    pub p5: f64,
    pub p95: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Accuracy {
    pub recall: Band,
    pub precision: Band,
    pub freq_rel_error: Band,
}

/// One algorithm's numbers from one trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub updates_per_ms: f64,
    pub space_bytes: f64,
    pub accuracy: Option<Accuracy>,
}

impl MetricsRecord {
    pub fn new(updates_per_ms: f64, space_bytes: f64) -> Self {
        Self {
            updates_per_ms,
            space_bytes,
            accuracy: None,
        }
    }
}

/// Everything recovered from one trial's output.
#[derive(Debug, Clone, Default)]
pub struct TrialReport {
    /// Successfully parsed algorithms, in mapping order.
    pub records: IndexMap<String, MetricsRecord>,
    /// Algorithms whose row was absent or malformed.
    pub rejected: Vec<ReportError>,
}

pub fn parse_report(raw: &str, mapping: &RowMapping) -> Result<TrialReport, ReportError> {
    let start = raw.find(REPORT_MARKER).ok_or(ReportError::ReportNotFound)?;
    let table: Vec<Vec<&str>> = raw[start..]
        .lines()
        .map(|line| line.split('\t').collect())
        .collect();

    let mut report = TrialReport::default();
    for (algorithm, row) in mapping.iter() {
        match parse_row(&table, algorithm, row) {
            Ok(record) => {
                report.records.insert(algorithm.to_string(), record);
            }
            Err(e) => report.rejected.push(e),
        }
    }
    Ok(report)
}

fn parse_row(table: &[Vec<&str>], algorithm: &str, row: usize) -> Result<MetricsRecord, ReportError> {
    let fields = table.get(row).ok_or_else(|| ReportError::RowMissing {
        algorithm: algorithm.to_string(),
        row,
    })?;

    let number = |column: usize| -> Result<f64, ReportError> {
        let raw = fields.get(column).copied().unwrap_or("");
        // `inf` is what the estimator prints when its timer saw no elapsed time.
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ReportError::RowMalformed {
                algorithm: algorithm.to_string(),
                row,
                column,
                value: raw.to_string(),
            })
    };

    Ok(MetricsRecord {
        updates_per_ms: number(UPDATES_COLUMN)?,
        space_bytes: number(SPACE_COLUMN)?,
        accuracy: parse_accuracy(fields),
    })
}

// All nine accuracy columns or nothing.
fn parse_accuracy(fields: &[&str]) -> Option<Accuracy> {
    let values: Vec<f64> = fields
        .get(ACCURACY_COLUMNS)?
        .iter()
        .map(|f| f.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect::<Option<_>>()?;
    let band = |i: usize| Band {
        mean: values[i],
        p5: values[i + 1],
        p95: values[i + 2],
    };
    Some(Accuracy {
        recall: band(0),
        precision: band(3),
        freq_rel_error: band(6),
    })
}
