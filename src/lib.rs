pub mod config;
pub mod error;

pub mod bench {
    pub mod mapping;
    pub mod report;
    pub mod runner;
    pub mod sweep;
}

pub mod metrics {
    pub mod aggregate;
}

pub mod trace {
    pub mod generate;
    pub mod postprocess;
    pub mod record;
    pub mod summary;
}

pub mod data {
    pub mod export;
    pub mod sqlite;
}

pub mod plot {
    pub mod histogram;
    pub mod html;
    pub mod table;
    pub mod tradeoff;
}

pub use bench::mapping::RowMapping;
pub use bench::report::{parse_report, MetricsRecord, TrialReport};
pub use bench::runner::{ProcessRunner, TrialOutput, TrialRunner};
pub use bench::sweep::{sweep, SweepPlan, SweepPoint, SweepResult};
pub use config::{EstimatorConfig, SweepConfig};
pub use error::{HarnessError, ReportError, Result};
pub use metrics::aggregate::AggregatedRecord;
