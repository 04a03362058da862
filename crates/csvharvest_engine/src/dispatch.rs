use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use engine_logging::{engine_debug, engine_error};
use futures_util::FutureExt;
use tokio::task::JoinSet;

/// Work executed for each job descriptor of a run.
#[async_trait::async_trait]
pub trait JobHandler<J>: Send + Sync {
    async fn handle(&self, job: J);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchReport {
    pub submitted: usize,
    pub completed: usize,
    /// Jobs whose handler panicked; they are counted, never retried.
    pub panicked: usize,
}

/// Fixed-size pool of tokio tasks draining a pre-built job list in order.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    workers: usize,
}

impl Dispatcher {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every job and wait for all of them; nothing is returned early.
    pub async fn run<J, H>(&self, jobs: Vec<J>, handler: Arc<H>) -> DispatchReport
    where
        J: Send + 'static,
        H: JobHandler<J> + 'static,
    {
        let submitted = jobs.len();
        let queue = Arc::new(Mutex::new(jobs.into_iter()));
        let mut workers = JoinSet::new();

        for worker in 0..self.workers.min(submitted) {
            let queue = queue.clone();
            let handler = handler.clone();
            workers.spawn(async move {
                let mut report = DispatchReport::default();
                loop {
                    let next = queue
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .next();
                    let Some(job) = next else {
                        break;
                    };
                    match AssertUnwindSafe(handler.handle(job)).catch_unwind().await {
                        Ok(()) => report.completed += 1,
                        Err(_) => {
                            engine_error!("worker {} job panicked", worker);
                            report.panicked += 1;
                        }
                    }
                }
                engine_debug!("worker {} drained queue", worker);
                report
            });
        }

        let mut report = DispatchReport {
            submitted,
            ..DispatchReport::default()
        };
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(worker) => {
                    report.completed += worker.completed;
                    report.panicked += worker.panicked;
                }
                Err(err) => engine_error!("worker task failed: {}", err),
            }
        }
        report
    }
}
