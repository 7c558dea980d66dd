use std::fs::File;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bench::mapping::RowMapping;
use crate::bench::report::{parse_report, MetricsRecord};
use crate::bench::runner::TrialRunner;
use crate::error::{HarnessError, Result};
use crate::metrics::aggregate::{aggregate, AggregatedRecord};

/// A validated sweep: which trace, which parameter values, how many trials.
#[derive(Debug, Clone)]
pub struct SweepPlan {
    trace_path: PathBuf,
    grid: Vec<f64>,
    mapping: RowMapping,
    trials_per_point: usize,
}

impl SweepPlan {
    pub fn new(
        trace_path: impl Into<PathBuf>,
        grid: Vec<f64>,
        mapping: RowMapping,
        trials_per_point: usize,
    ) -> Result<Self> {
        if grid.is_empty() {
            return Err(HarnessError::InvalidConfig("parameter grid is empty".into()));
        }
        if let Some(bad) = grid.iter().find(|p| !p.is_finite()) {
            return Err(HarnessError::InvalidConfig(format!(
                "parameter grid contains non-finite value {bad}"
            )));
        }
        if trials_per_point == 0 {
            return Err(HarnessError::InvalidConfig(
                "trials_per_point must be at least 1".into(),
            ));
        }
        Ok(Self {
            trace_path: trace_path.into(),
            grid,
            mapping,
            trials_per_point,
        })
    }

    pub fn trace_path(&self) -> &Path {
        &self.trace_path
    }

    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    pub fn mapping(&self) -> &RowMapping {
        &self.mapping
    }

    pub fn trials_per_point(&self) -> usize {
        self.trials_per_point
    }

    pub fn total_trials(&self) -> u64 {
        (self.grid.len() * self.trials_per_point) as u64
    }
}

/// Outcome of every trial at one parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub parameter: f64,
    pub attempted: usize,
    /// Trials whose output contained a report.
    pub located: usize,
    pub timed_out: usize,
    /// Algorithms with at least one parsed trial, in mapping order.
    pub records: IndexMap<String, AggregatedRecord>,
    /// Algorithms for which every trial failed: no data at this point.
    pub missing: Vec<String>,
}

impl SweepPoint {
    pub fn new(parameter: f64) -> Self {
        Self {
            parameter,
            attempted: 0,
            located: 0,
            timed_out: 0,
            records: IndexMap::new(),
            missing: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    /// Mapped algorithms in mapping order.
    pub algorithms: Vec<String>,
    /// One entry per grid value, in grid order.
    pub points: Vec<SweepPoint>,
}

impl SweepResult {
    pub fn get(&self, algorithm: &str, parameter: f64) -> Option<&AggregatedRecord> {
        self.points
            .iter()
            .find(|p| p.parameter == parameter)
            .and_then(|p| p.records.get(algorithm))
    }

    /// Grid-ordered `(parameter, record)` pairs; points without data are skipped.
    pub fn series(&self, algorithm: &str) -> Vec<(f64, &AggregatedRecord)> {
        self.points
            .iter()
            .filter_map(|p| p.records.get(algorithm).map(|r| (p.parameter, r)))
            .collect()
    }

    pub fn parameters(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.parameter).collect()
    }
}

pub fn progress_bar(total: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
    {
        pb.set_style(style.progress_chars("##-"));
    }
    pb
}

/// Run every trial of `plan` and average the parsed metrics per grid point.
///
/// Trials are strictly sequential. A trial without a report, a timed out
/// trial, or a malformed row only removes data; launch failures abort.
pub fn sweep<R: TrialRunner + ?Sized>(
    runner: &mut R,
    plan: &SweepPlan,
    progress: &ProgressBar,
) -> Result<SweepResult> {
    check_trace(plan.trace_path())?;
    let mapping = plan.mapping();
    let mut points = Vec::with_capacity(plan.grid().len());

    for &parameter in plan.grid() {
        info!(parameter, trials = plan.trials_per_point(), "running sweep point");
        progress.set_message(format!("gamma={parameter}"));

        let mut point = SweepPoint::new(parameter);
        let mut parsed: IndexMap<&str, Vec<MetricsRecord>> =
            mapping.names().map(|name| (name, Vec::new())).collect();

        for trial in 0..plan.trials_per_point() {
            let output = runner.run(plan.trace_path(), parameter)?;
            point.attempted += 1;
            progress.inc(1);

            if output.timed_out {
                point.timed_out += 1;
                continue;
            }
            let report = match parse_report(&output.stdout_text(), mapping) {
                Ok(report) => report,
                Err(e) => {
                    warn!(
                        parameter,
                        trial,
                        error = %e,
                        status = ?output.status,
                        stderr = %output.stderr_text().trim(),
                        "skipping trial"
                    );
                    continue;
                }
            };
            point.located += 1;
            for rejected in &report.rejected {
                warn!(parameter, trial, error = %rejected, "dropping algorithm from trial");
            }
            for (name, record) in report.records {
                if let Some(slot) = parsed.get_mut(name.as_str()) {
                    slot.push(record);
                }
            }
        }

        for (name, records) in &parsed {
            match aggregate(records) {
                Some(agg) => {
                    debug!(parameter, algorithm = *name, trials = agg.trials, "aggregated");
                    point.records.insert(name.to_string(), agg);
                }
                None => {
                    warn!(parameter, algorithm = *name, "all trials failed, no data");
                    point.missing.push(name.to_string());
                }
            }
        }
        points.push(point);
    }

    progress.finish_and_clear();
    Ok(SweepResult {
        algorithms: mapping.names().map(str::to_string).collect(),
        points,
    })
}

fn check_trace(path: &Path) -> Result<()> {
    let unreadable = |source: std::io::Error| HarnessError::TraceUnreadable {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(unreadable)?;
    let meta = file.metadata().map_err(unreadable)?;
    if !meta.is_file() {
        return Err(unreadable(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    Ok(())
}
