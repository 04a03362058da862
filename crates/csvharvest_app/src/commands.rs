//! Async subcommand runners; `main` drives them on its tokio runtime.

use std::sync::Arc;

use anyhow::{Context, Result};
use csvharvest_core::MetricsSnapshot;
use csvharvest_engine::{
    run_fetch, run_process, Api, DatasetPager, FetchRunConfig, HttpSettings, LogProgressSink,
    ProcessRunConfig, ProgressStyle, RunSummary,
};
use engine_logging::{engine_info, engine_warn};

use crate::cli::{FetchArgs, ListArgs, ProcessArgs};

pub async fn fetch(args: FetchArgs) -> Result<()> {
    let mut config = FetchRunConfig::new(args.output);
    config.api_base = args.api;
    config.increment = args.increment;
    config.workers = usize::from(args.threads);

    let sink = Arc::new(LogProgressSink::new(ProgressStyle::Fetch));
    let summary = run_fetch(config, sink).await.context("fetch run failed")?;
    log_summary("fetch", &summary);
    Ok(())
}

pub async fn process(args: ProcessArgs) -> Result<()> {
    let mut config = ProcessRunConfig::new(args.input, args.output);
    config.workers = usize::from(args.threads);

    let sink = Arc::new(LogProgressSink::new(ProgressStyle::Process));
    let summary = run_process(config, sink)
        .await
        .context("process run failed")?;
    log_summary("process", &summary);
    Ok(())
}

pub async fn list(args: ListArgs) -> Result<()> {
    let client = HttpSettings::default().build_client()?;
    let api = Api::new(&args.api, client)?;
    let mut pager = DatasetPager::new(api, args.increment, 1);

    let mut shown = 0usize;
    while args.limit.map_or(true, |limit| shown < limit) {
        let Some(dataset) = pager
            .next_dataset()
            .await
            .with_context(|| format!("listing stopped at page {}", pager.page()))?
        else {
            break;
        };
        engine_info!(
            "{} {} resources={}",
            dataset.id,
            dataset.uri,
            dataset.resources.len()
        );
        shown += 1;
    }
    engine_info!("listed {} datasets", shown);
    Ok(())
}

fn log_summary(run: &str, summary: &RunSummary) {
    let MetricsSnapshot {
        jobs,
        fetched,
        resources,
        success,
        error,
        nocsv,
        duplicate,
    } = summary.metrics;
    engine_info!(
        "{} done: jobs={} fetched={} resources={} success={} error={} nocsv={} duplicate={} -> {:?}",
        run,
        jobs,
        fetched,
        resources,
        success,
        error,
        nocsv,
        duplicate,
        summary.output
    );
    if summary.dispatch.panicked > 0 {
        engine_warn!(
            "{} of {} jobs panicked",
            summary.dispatch.panicked,
            summary.dispatch.submitted
        );
    }
}
