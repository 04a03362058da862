//! csvharvest core: catalog data model, per-dataset resource classification and run metrics.
mod classify;
mod dataset;
mod metrics;
mod record;

pub use classify::{classify_resources, ResourceVerdict, CSV_MIME};
pub use dataset::{Dataset, DatasetPage, Resource};
pub use metrics::{JobId, Metrics, MetricsSnapshot};
pub use record::{RecordParseError, ResourceRecord, RECORD_HEADER, RECORD_SEPARATOR};
