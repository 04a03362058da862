//! Fetch pipeline: catalog pages -> deduplicated `dataset|id|url` records.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use csvharvest_core::{
    classify_resources, Dataset, DatasetPage, JobId, Metrics, ResourceVerdict, RECORD_HEADER,
};
use engine_logging::{engine_error, engine_info, engine_warn};

use crate::{
    Api, AppendWriter, Dispatcher, EngineError, HttpSettings, JobEvent, JobEventKind,
    JobHandler, ProgressSink, QueryError, RunSummary, DEFAULT_API_BASE,
};

#[derive(Debug, Clone)]
pub struct FetchRunConfig {
    pub api_base: String,
    pub output: PathBuf,
    /// Datasets requested per page job.
    pub increment: u32,
    pub workers: usize,
    /// Pause before the single retry of a failed page.
    pub retry_delay: Duration,
    pub http: HttpSettings,
}

impl FetchRunConfig {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            output: output.into(),
            increment: 10,
            workers: 2,
            retry_delay: Duration::from_millis(200),
            http: HttpSettings::default(),
        }
    }
}

/// One API page to fetch. `page` is the 1-based upstream page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPageJob {
    pub page: u64,
    pub page_size: u32,
}

impl FetchPageJob {
    pub fn label(&self) -> String {
        format!("{}-{}", self.page, self.page_size)
    }
}

/// Build one job per page of `page_size` needed to cover the reported total.
pub fn plan_fetch_jobs(first: &DatasetPage, page_size: u32) -> Vec<FetchPageJob> {
    let page_size = page_size.max(1);
    (0..first.pages_to_fetch(page_size))
        .map(|index| FetchPageJob {
            page: index + 1,
            page_size,
        })
        .collect()
}

pub async fn run_fetch(
    config: FetchRunConfig,
    sink: Arc<dyn ProgressSink>,
) -> Result<RunSummary, EngineError> {
    let writer = AppendWriter::create(&config.output, &format!("{RECORD_HEADER}\n"))?;
    let client = config.http.build_client()?;
    let api = Api::new(&config.api_base, client)?;

    let mut count = api.datasets(1, 1);
    count.get().await?;
    let first = count.dataset_page()?;
    let total = first.total.unwrap_or(0);
    let jobs = plan_fetch_jobs(&first, config.increment);
    engine_info!(
        "fetch: {} datasets reported, {} page jobs of {} on {} workers",
        total,
        jobs.len(),
        config.increment,
        config.workers
    );

    let metrics = Arc::new(Metrics::new());
    let handler = Arc::new(FetchPageHandler {
        api,
        writer: Arc::new(writer),
        metrics: metrics.clone(),
        sink,
        retry_delay: config.retry_delay,
    });
    let dispatch = Dispatcher::new(config.workers).run(jobs, handler).await;

    Ok(RunSummary {
        metrics: metrics.snapshot(),
        dispatch,
        output: config.output,
    })
}

pub struct FetchPageHandler {
    pub api: Api,
    pub writer: Arc<AppendWriter>,
    pub metrics: Arc<Metrics>,
    pub sink: Arc<dyn ProgressSink>,
    pub retry_delay: Duration,
}

impl FetchPageHandler {
    fn emit(&self, job_id: JobId, kind: JobEventKind, subject: &str) {
        self.sink.emit(JobEvent {
            job_id,
            kind,
            subject: subject.to_string(),
            metrics: self.metrics.snapshot(),
        });
    }

    async fn fetch_page(&self, job: FetchPageJob) -> Result<Vec<Dataset>, QueryError> {
        let mut query = self.api.datasets(job.page_size, job.page);
        query.get().await?;
        Ok(query.dataset_page()?.data)
    }

    /// One retry after `retry_delay`, then give up.
    async fn fetch_page_with_retry(&self, job: FetchPageJob) -> Result<Vec<Dataset>, QueryError> {
        match self.fetch_page(job).await {
            Ok(datasets) => Ok(datasets),
            Err(err) => {
                engine_warn!("page {} failed, retrying once: {}", job.label(), err);
                tokio::time::sleep(self.retry_delay).await;
                self.fetch_page(job).await
            }
        }
    }

    /// Filter and record the resources of one page's datasets.
    pub fn record_datasets(&self, job_id: JobId, datasets: &[Dataset]) {
        for dataset in datasets {
            self.metrics.record_fetched();
            for verdict in classify_resources(dataset) {
                self.metrics.record_resource();
                match verdict {
                    ResourceVerdict::NotCsv(resource) => {
                        self.metrics.record_nocsv();
                        self.emit(job_id, JobEventKind::NoCsv, &resource.id);
                    }
                    ResourceVerdict::Duplicate(resource) => {
                        self.metrics.record_duplicate();
                        self.emit(job_id, JobEventKind::Duplicate, &resource.id);
                    }
                    ResourceVerdict::Accepted(record) => {
                        match self.writer.append(&record.to_line()) {
                            Ok(()) => {
                                self.metrics.record_success();
                                self.emit(job_id, JobEventKind::Success, &record.id);
                            }
                            Err(err) => {
                                engine_error!(
                                    "failed to write record {} to {:?}: {}",
                                    record.id,
                                    self.writer.path(),
                                    err
                                );
                                self.metrics.record_error();
                                self.emit(job_id, JobEventKind::Error, &record.id);
                            }
                        }
                    }
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl JobHandler<FetchPageJob> for FetchPageHandler {
    async fn handle(&self, job: FetchPageJob) {
        let job_id = self.metrics.next_job_id();
        let label = job.label();
        self.emit(job_id, JobEventKind::Up, &label);

        let datasets = match self.fetch_page_with_retry(job).await {
            Ok(datasets) => datasets,
            Err(err) => {
                engine_error!("page {} abandoned: {}", label, err);
                self.emit(job_id, JobEventKind::Crash, &label);
                return;
            }
        };

        self.record_datasets(job_id, &datasets);
        self.emit(job_id, JobEventKind::Down, &label);
    }
}
