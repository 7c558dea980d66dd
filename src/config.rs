//! Sweep configuration, loaded from JSON and overridable from the command line.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::bench::mapping::RowMapping;
use crate::bench::sweep::SweepPlan;
use crate::error::{HarnessError, Result};

/// How to invoke the estimator. Flag names belong here, not in the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub program: PathBuf,
    pub trace_flag: String,
    pub parameter_flag: String,
    /// Passed before the trace and parameter flags, e.g. `["-phi", "0.001"]`.
    pub extra_args: Vec<String>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("../build/hh"),
            trace_flag: "-f".into(),
            parameter_flag: "-gamma".into(),
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub trace_path: PathBuf,
    pub parameter_grid: Vec<f64>,
    /// Algorithm name to 1-based report row, kept in file order.
    pub algorithm_row_mapping: IndexMap<String, usize>,
    pub trials_per_point: usize,
    pub trial_timeout_secs: Option<f64>,
    pub estimator: EstimatorConfig,
}

impl Default for SweepConfig {
    fn default() -> Self {
        let mut mapping = IndexMap::new();
        mapping.insert("IMSUM".to_string(), 1);
        mapping.insert("DIMSUM++".to_string(), 2);
        mapping.insert("DIMSUM".to_string(), 3);
        Self {
            trace_path: PathBuf::from("../trace/sanjose.dmp"),
            parameter_grid: vec![0.8, 1.0, 1.2, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
            algorithm_row_mapping: mapping,
            trials_per_point: 1,
            trial_timeout_secs: None,
            estimator: EstimatorConfig::default(),
        }
    }
}

impl SweepConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    pub fn mapping(&self) -> Result<RowMapping> {
        RowMapping::new(
            self.algorithm_row_mapping
                .iter()
                .map(|(name, row)| (name.clone(), *row)),
        )
    }

    pub fn timeout(&self) -> Result<Option<Duration>> {
        match self.trial_timeout_secs {
            None => Ok(None),
            Some(secs) if secs.is_finite() && secs > 0.0 => Ok(Some(Duration::from_secs_f64(secs))),
            Some(secs) => Err(HarnessError::InvalidConfig(format!(
                "trial_timeout_secs must be positive, got {secs}"
            ))),
        }
    }

    /// Validate everything needed before the first trial is launched.
    pub fn plan(&self) -> Result<SweepPlan> {
        self.timeout()?;
        SweepPlan::new(
            self.trace_path.clone(),
            self.parameter_grid.clone(),
            self.mapping()?,
            self.trials_per_point,
        )
    }
}
