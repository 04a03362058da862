//! Process pipeline: intermediate records -> JSON array of CSV profiles.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use csvharvest_core::{JobId, Metrics, ResourceRecord, RECORD_HEADER};
use engine_logging::{engine_info, engine_warn};

use crate::{
    AppendWriter, CsvSniffer, Dispatcher, EngineError, HttpSettings, JobEvent, JobEventKind,
    JobHandler, ProgressSink, RunSummary,
};

#[derive(Debug, Clone)]
pub struct ProcessRunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub workers: usize,
    pub http: HttpSettings,
}

impl ProcessRunConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            workers: 16,
            http: HttpSettings::default(),
        }
    }
}

/// One row of the intermediate file: the resource URL plus every other column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    pub url: String,
    pub meta: BTreeMap<String, String>,
}

impl From<ResourceRecord> for InputRow {
    fn from(record: ResourceRecord) -> Self {
        let meta = BTreeMap::from([
            ("dataset".to_string(), record.dataset),
            ("id".to_string(), record.id),
        ]);
        Self {
            url: record.url,
            meta,
        }
    }
}

impl InputRow {
    /// Label used in progress lines: the resource id when present.
    pub fn label(&self) -> &str {
        self.meta.get("id").map_or(self.url.as_str(), String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRowJob {
    pub row: InputRow,
}

/// Rows read from the intermediate file; rows without a URL are counted apart.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadedRows {
    pub rows: Vec<InputRow>,
    pub skipped: usize,
}

/// Read a fetch output file: the `dataset|id|url` header, then one record
/// per line. URLs keep any `|` they contain.
pub fn load_rows(path: &Path) -> Result<LoadedRows, EngineError> {
    let input_error = |message: String| EngineError::Input {
        path: path.display().to_string(),
        message,
    };
    let file = File::open(path).map_err(|err| input_error(err.to_string()))?;
    let mut lines = BufReader::new(file).lines();

    let header = lines
        .next()
        .transpose()
        .map_err(|err| input_error(err.to_string()))?
        .unwrap_or_default();
    if header.trim_end_matches('\r') != RECORD_HEADER {
        return Err(input_error(format!(
            "expected header {RECORD_HEADER:?}, got {header:?}"
        )));
    }

    let mut loaded = LoadedRows::default();
    for (index, line) in lines.enumerate() {
        let line = line.map_err(|err| input_error(err.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        match ResourceRecord::parse_line(&line) {
            Ok(record) => loaded.rows.push(InputRow::from(record)),
            Err(err) => {
                engine_warn!("skipping line {}: {}", index + 2, err);
                loaded.skipped += 1;
            }
        }
    }
    Ok(loaded)
}

pub async fn run_process(
    config: ProcessRunConfig,
    sink: Arc<dyn ProgressSink>,
) -> Result<RunSummary, EngineError> {
    let loaded = load_rows(&config.input)?;
    let writer = Arc::new(AppendWriter::create(&config.output, "[\n")?);
    let client = config.http.build_client()?;

    let metrics = Arc::new(Metrics::new());
    for _ in 0..loaded.skipped {
        metrics.record_resource();
        metrics.record_error();
    }
    engine_info!(
        "process: {} rows from {:?} on {} workers ({} skipped)",
        loaded.rows.len(),
        config.input,
        config.workers,
        loaded.skipped
    );

    let jobs: Vec<ProcessRowJob> = loaded
        .rows
        .into_iter()
        .map(|row| ProcessRowJob { row })
        .collect();
    let handler = Arc::new(ProcessRowHandler {
        client,
        writer: writer.clone(),
        metrics: metrics.clone(),
        sink,
        max_line_bytes: config.http.max_line_bytes,
    });
    let dispatch = Dispatcher::new(config.workers).run(jobs, handler).await;
    writer.close_json_array()?;

    Ok(RunSummary {
        metrics: metrics.snapshot(),
        dispatch,
        output: config.output,
    })
}

pub struct ProcessRowHandler {
    pub client: reqwest::Client,
    pub writer: Arc<AppendWriter>,
    pub metrics: Arc<Metrics>,
    pub sink: Arc<dyn ProgressSink>,
    pub max_line_bytes: usize,
}

impl ProcessRowHandler {
    fn emit(&self, job_id: JobId, kind: JobEventKind, subject: &str) {
        self.sink.emit(JobEvent {
            job_id,
            kind,
            subject: subject.to_string(),
            metrics: self.metrics.snapshot(),
        });
    }

    async fn sniff_row(&self, row: &InputRow) -> Result<String, String> {
        let mut sniffer = CsvSniffer::new(row.url.clone(), row.meta.clone());
        let profile = sniffer
            .sniff(&self.client, self.max_line_bytes)
            .await
            .map_err(|err| err.to_string())?;
        serde_json::to_string(&profile).map_err(|err| err.to_string())
    }
}

#[async_trait::async_trait]
impl JobHandler<ProcessRowJob> for ProcessRowHandler {
    async fn handle(&self, job: ProcessRowJob) {
        let job_id = self.metrics.next_job_id();
        let label = job.row.label().to_string();
        self.metrics.record_resource();
        self.emit(job_id, JobEventKind::Up, &label);

        let outcome = match self.sniff_row(&job.row).await {
            Ok(json) => self
                .writer
                .append_json_element(&json)
                .map_err(|err| format!("failed to write profile: {err}")),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(()) => {
                self.metrics.record_success();
                self.emit(job_id, JobEventKind::Success, &label);
            }
            Err(err) => {
                engine_warn!("job {} ({}) failed: {}", job_id, label, err);
                self.metrics.record_error();
                self.emit(job_id, JobEventKind::Error, &label);
            }
        }

        self.emit(job_id, JobEventKind::Down, &label);
    }
}
