//! RunHandle - the caller's side of a started run

use std::path::PathBuf;

use contracts::{LoggingError, ProgressEvent, RunSummary, RunTermination};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use crate::error::DispatchError;

/// Everything a run emits on its event channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// One per send outcome, in attempt order
    Progress(ProgressEvent),
    /// Always the last event of a run
    Finished(RunReport),
}

/// Final report of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub summary: RunSummary,
    pub termination: RunTermination,
    /// Run log file, when one was written
    pub log_path: Option<PathBuf>,
}

impl RunReport {
    pub fn was_cancelled(&self) -> bool {
        self.termination == RunTermination::Cancelled
    }
}

/// All events of a finished run, drained in order
#[derive(Debug)]
pub struct CollectedRun {
    pub progress: Vec<ProgressEvent>,
    pub report: RunReport,
    pub log_errors: Vec<LoggingError>,
}

impl CollectedRun {
    /// Progress events that closed an attempt
    pub fn terminal_progress(&self) -> impl Iterator<Item = &ProgressEvent> {
        self.progress.iter().filter(|e| e.outcome.is_terminal())
    }
}

/// Handle to a running dispatch
///
/// Progress and run-log failures arrive on separate channels.
#[derive(Debug)]
pub struct RunHandle {
    events: mpsc::UnboundedReceiver<RunEvent>,
    log_errors: mpsc::UnboundedReceiver<LoggingError>,
    task: JoinHandle<RunReport>,
}

impl RunHandle {
    pub(crate) fn new(
        events: mpsc::UnboundedReceiver<RunEvent>,
        log_errors: mpsc::UnboundedReceiver<LoggingError>,
        task: JoinHandle<RunReport>,
    ) -> Self {
        Self {
            events,
            log_errors,
            task,
        }
    }

    /// Next event; `None` once the run has finished and the channel drained
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        self.events.recv().await
    }

    /// Next run-log failure; `None` once the run has finished and the channel drained
    pub async fn next_log_error(&mut self) -> Option<LoggingError> {
        self.log_errors.recv().await
    }

    /// Run-log failure already queued, without waiting
    pub fn try_next_log_error(&mut self) -> Option<LoggingError> {
        self.log_errors.try_recv().ok()
    }

    /// Wait for the run to end, discarding unread events
    #[instrument(name = "run_handle_wait", skip(self))]
    pub async fn wait(self) -> Result<RunReport, DispatchError> {
        let report = self.task.await?;
        debug!(termination = ?report.termination, "Run joined");
        Ok(report)
    }

    /// Drain every event until `Finished`, then join the run task
    #[instrument(name = "run_handle_collect", skip(self))]
    pub async fn collect(mut self) -> Result<CollectedRun, DispatchError> {
        let mut progress = Vec::new();
        let mut finished = None;
        while let Some(event) = self.events.recv().await {
            match event {
                RunEvent::Progress(p) => progress.push(p),
                RunEvent::Finished(report) => finished = Some(report),
            }
        }

        let mut log_errors = Vec::new();
        while let Ok(err) = self.log_errors.try_recv() {
            log_errors.push(err);
        }

        let joined = self.task.await?;
        Ok(CollectedRun {
            progress,
            report: finished.unwrap_or(joined),
            log_errors,
        })
    }
}
