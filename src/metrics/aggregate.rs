use serde::{Deserialize, Serialize};

use crate::bench::report::{Accuracy, Band, MetricsRecord};

/// Per-algorithm summary of every trial that parsed at one parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRecord {
    pub updates_per_ms: f64,
    pub space_bytes: f64,
    /// Number of trials averaged; always at least 1.
    pub trials: usize,
    /// Sample standard deviation of updates/ms, 0 for a single trial.
    pub updates_per_ms_stddev: f64,
    pub accuracy: Option<Accuracy>,
}

/// Unweighted mean over the successful trials only.
///
/// Returns `None` for an empty slice: no trials means no data, not zeros.
pub fn aggregate(records: &[MetricsRecord]) -> Option<AggregatedRecord> {
    if records.is_empty() {
        return None;
    }
    let updates: Vec<f64> = records.iter().map(|r| r.updates_per_ms).collect();
    let space: Vec<f64> = records.iter().map(|r| r.space_bytes).collect();
    let accuracies: Vec<Accuracy> = records.iter().filter_map(|r| r.accuracy).collect();

    Some(AggregatedRecord {
        updates_per_ms: mean(&updates)?,
        space_bytes: mean(&space)?,
        trials: records.len(),
        updates_per_ms_stddev: sample_stddev(&updates),
        accuracy: mean_accuracy(&accuracies),
    })
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn sample_stddev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}

fn mean_accuracy(accuracies: &[Accuracy]) -> Option<Accuracy> {
    if accuracies.is_empty() {
        return None;
    }
    let band = |pick: fn(&Accuracy) -> Band| {
        let bands: Vec<Band> = accuracies.iter().map(pick).collect();
        let n = bands.len() as f64;
        Band {
            mean: bands.iter().map(|b| b.mean).sum::<f64>() / n,
            p5: bands.iter().map(|b| b.p5).sum::<f64>() / n,
            p95: bands.iter().map(|b| b.p95).sum::<f64>() / n,
        }
    };
    Some(Accuracy {
        recall: band(|a| a.recall),
        precision: band(|a| a.precision),
        freq_rel_error: band(|a| a.freq_rel_error),
    })
}
