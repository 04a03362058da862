use std::path::PathBuf;

use csvharvest_core::MetricsSnapshot;

use crate::DispatchReport;

/// Outcome of a whole fetch or process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub metrics: MetricsSnapshot,
    pub dispatch: DispatchReport,
    pub output: PathBuf,
}
