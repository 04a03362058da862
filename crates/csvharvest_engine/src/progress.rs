use csvharvest_core::{JobId, MetricsSnapshot};
use engine_logging::{engine_info, engine_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobEventKind {
    Up,
    Down,
    Success,
    Error,
    Crash,
    NoCsv,
    Duplicate,
}

impl JobEventKind {
    fn icon(self) -> &'static str {
        match self {
            JobEventKind::Up => "▲",
            JobEventKind::Down => "▼",
            JobEventKind::Success => "■",
            JobEventKind::Error => "■",
            JobEventKind::Crash => "❌",
            JobEventKind::NoCsv => "■",
            JobEventKind::Duplicate => "■",
        }
    }

    fn is_failure(self) -> bool {
        matches!(
            self,
            JobEventKind::Error | JobEventKind::Crash | JobEventKind::NoCsv | JobEventKind::Duplicate
        )
    }
}

/// One observable step of a job, with the metrics as they were right after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEvent {
    pub job_id: JobId,
    pub kind: JobEventKind,
    /// Page label (`page-size`) or resource id.
    pub subject: String,
    pub metrics: MetricsSnapshot,
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: JobEvent);
}

/// Layout of the progress line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStyle {
    /// `{icon} ({job}:{success}/{error}/{nocsv}/{duplicate}) {id}`
    Fetch,
    /// `{icon} ({job}:{success}/{error}) {id}`
    Process,
}

/// Renders job events as log lines; failures go out at warn level.
#[derive(Debug, Clone, Copy)]
pub struct LogProgressSink {
    style: ProgressStyle,
}

impl LogProgressSink {
    pub fn new(style: ProgressStyle) -> Self {
        Self { style }
    }

    pub fn render(&self, event: &JobEvent) -> String {
        let m = &event.metrics;
        match self.style {
            ProgressStyle::Fetch => format!(
                "{} ({}:{}/{}/{}/{}) {}",
                event.kind.icon(),
                event.job_id,
                m.success,
                m.error,
                m.nocsv,
                m.duplicate,
                event.subject
            ),
            ProgressStyle::Process => format!(
                "{} ({}:{}/{}) {}",
                event.kind.icon(),
                event.job_id,
                m.success,
                m.error,
                event.subject
            ),
        }
    }
}

impl ProgressSink for LogProgressSink {
    fn emit(&self, event: JobEvent) {
        let line = self.render(&event);
        if event.kind.is_failure() {
            engine_warn!("{}", line);
        } else {
            engine_info!("{}", line);
        }
    }
}
