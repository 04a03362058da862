//! csvharvest engine: catalog client, CSV sniffing and the concurrent fetch/process pipelines.
mod api;
mod datasets;
mod decode;
mod dialect;
mod dispatch;
mod error;
mod fetch;
mod persist;
mod process;
mod progress;
mod settings;
mod sniff;
mod types;

pub use api::{Api, Query};
pub use datasets::DatasetPager;
pub use decode::{decode_line, detect_charset, DecodeError, DecodedLine, ASCII_LABEL};
pub use dialect::{
    infer_dialect, parse_headers, resolve_delimiter, sniff_dialect, Dialect, HeaderError,
    HEURISTIC_DELIMITERS,
};
pub use dispatch::{DispatchReport, Dispatcher, JobHandler};
pub use error::{EngineError, NavigationError, QueryError, SniffError};
pub use fetch::{plan_fetch_jobs, run_fetch, FetchPageHandler, FetchPageJob, FetchRunConfig};
pub use persist::{ensure_parent_dir, AppendWriter, PersistError};
pub use process::{
    load_rows, run_process, InputRow, LoadedRows, ProcessRowHandler, ProcessRowJob,
    ProcessRunConfig,
};
pub use progress::{JobEvent, JobEventKind, LogProgressSink, ProgressSink, ProgressStyle};
pub use settings::{HttpSettings, DEFAULT_API_BASE};
pub use sniff::{CsvProfile, CsvSniffer, SnifferState, PROFILE_KEYS};
pub use types::RunSummary;
