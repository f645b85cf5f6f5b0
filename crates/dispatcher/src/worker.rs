//! DispatchWorker - runs one bulk dispatch on a background task

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use contracts::{
    AttemptOutcome, ChannelKind, DeliverySettings, DispatchRequest, LogRecord, LoggingError,
    MessageId, MessagePayload, ProgressEvent, RunSummary, RunTermination, SenderIdentity,
    Transport, TransportError,
};
use sender_pool::SenderPool;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::DispatchError;
use crate::handle::{RunEvent, RunHandle, RunReport};
use crate::metrics::{MetricsSnapshot, RunMetrics};
use crate::run_logger::RunLogger;

/// Lifecycle of a worker. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl WorkerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl From<RunTermination> for WorkerState {
    fn from(termination: RunTermination) -> Self {
        match termination {
            RunTermination::Completed => Self::Completed,
            RunTermination::Cancelled => Self::Cancelled,
        }
    }
}

/// Per-run knobs that do not change between attempts
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub channel: ChannelKind,
    pub payload: MessagePayload,
    /// Pause between consecutive attempts
    pub throttle: Duration,
    /// Pause between a failed first send and its retry
    pub retry_backoff: Duration,
    /// Directory receiving the run log file
    pub log_directory: PathBuf,
}

impl WorkerConfig {
    pub fn from_settings(settings: &DeliverySettings) -> Self {
        Self {
            channel: settings.message.channel,
            payload: settings.message.payload(),
            throttle: settings.timing.throttle(),
            retry_backoff: settings.timing.retry_backoff(),
            log_directory: settings.logging.directory.clone(),
        }
    }

    /// No pauses at all
    pub fn immediate(channel: ChannelKind, log_directory: impl Into<PathBuf>) -> Self {
        Self {
            channel,
            payload: MessagePayload::default(),
            throttle: Duration::ZERO,
            retry_backoff: Duration::ZERO,
            log_directory: log_directory.into(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::from_settings(&DeliverySettings::default())
    }
}

/// Cloneable way to request cancellation from another task
#[derive(Debug, Clone)]
pub struct StopHandle {
    cancel: CancellationToken,
    state: watch::Receiver<WorkerState>,
}

impl StopHandle {
    /// Request cancellation. No effect unless the run is in progress.
    pub fn stop(&self) {
        request_stop(&self.cancel, *self.state.borrow());
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }
}

fn request_stop(cancel: &CancellationToken, state: WorkerState) {
    if state == WorkerState::Running {
        debug!("Stop requested");
        cancel.cancel();
    }
}

/// Executes at most one run: `attempt_count` sends from rotating senders
pub struct DispatchWorker<T> {
    config: WorkerConfig,
    pool: Option<SenderPool>,
    transport: Arc<T>,
    cancel: CancellationToken,
    state: Arc<watch::Sender<WorkerState>>,
    metrics: Arc<RunMetrics>,
}

impl<T> DispatchWorker<T>
where
    T: Transport + Sync + 'static,
{
    pub fn new(pool: SenderPool, transport: T, config: WorkerConfig) -> Self {
        let (state, _) = watch::channel(WorkerState::Idle);
        Self {
            config,
            pool: Some(pool),
            transport: Arc::new(transport),
            cancel: CancellationToken::new(),
            state: Arc::new(state),
            metrics: Arc::new(RunMetrics::new()),
        }
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Live counters of the run
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Begin the run; returns immediately.
    ///
    /// # Errors
    /// `InvalidState` if the worker has already been started.
    #[instrument(
        name = "dispatch_worker_start",
        skip(self, request),
        fields(
            recipient = %request.recipient(),
            attempts = request.attempt_count(),
            transport = self.transport.name()
        )
    )]
    pub fn start(&mut self, request: DispatchRequest) -> Result<RunHandle, DispatchError> {
        let state = self.state();
        let pool = match (state, self.pool.take()) {
            (WorkerState::Idle, Some(pool)) => pool,
            (state, pool) => {
                self.pool = pool;
                return Err(DispatchError::InvalidState { state });
            }
        };

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (log_errors_tx, log_errors_rx) = mpsc::unbounded_channel();

        let logger = request
            .logging_enabled()
            .then(|| RunLogger::new(&self.config.log_directory, self.config.channel, Local::now()));

        let run = Run {
            request,
            pool,
            transport: Arc::clone(&self.transport),
            config: self.config.clone(),
            logger,
            cancel: self.cancel.clone(),
            state: Arc::clone(&self.state),
            events: events_tx,
            log_errors: log_errors_tx,
            metrics: Arc::clone(&self.metrics),
            sent: 0,
            failed: 0,
        };

        // Running before the task exists so an immediate stop() is honoured
        self.state.send_replace(WorkerState::Running);
        let task = tokio::spawn(run.execute());

        Ok(RunHandle::new(events_rx, log_errors_rx, task))
    }

    /// Request cancellation; idempotent, no effect outside `Running`
    pub fn stop(&self) {
        request_stop(&self.cancel, self.state());
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            cancel: self.cancel.clone(),
            state: self.state.subscribe(),
        }
    }

    /// Resolve once the worker reaches `Completed` or `Cancelled`.
    ///
    /// Returns `Idle` straight away for a worker that was never started.
    pub async fn wait_terminal(&self) -> WorkerState {
        let mut state = self.state.subscribe();
        if *state.borrow_and_update() == WorkerState::Idle {
            return WorkerState::Idle;
        }
        let terminal = match state.wait_for(WorkerState::is_terminal).await {
            Ok(state) => *state,
            // Sender lives in self, so the channel cannot close while we borrow it
            Err(_) => self.state(),
        };
        terminal
    }
}

/// State owned by the run task
struct Run<T> {
    request: DispatchRequest,
    pool: SenderPool,
    transport: Arc<T>,
    config: WorkerConfig,
    logger: Option<RunLogger>,
    cancel: CancellationToken,
    state: Arc<watch::Sender<WorkerState>>,
    events: mpsc::UnboundedSender<RunEvent>,
    log_errors: mpsc::UnboundedSender<LoggingError>,
    metrics: Arc<RunMetrics>,
    sent: u32,
    failed: u32,
}

impl<T> Run<T>
where
    T: Transport + Sync + 'static,
{
    #[instrument(
        name = "dispatch_run",
        skip(self),
        fields(
            recipient = %self.request.recipient(),
            attempts = self.request.attempt_count(),
            channel = %self.config.channel
        )
    )]
    async fn execute(mut self) -> RunReport {
        info!("Run started");

        let total = self.request.attempt_count();
        let mut termination = RunTermination::Completed;

        for index in 0..total {
            if self.cancel.is_cancelled() {
                termination = RunTermination::Cancelled;
                break;
            }

            let sender = self.pool.next(index);
            self.attempt(index + 1, sender).await;

            if index + 1 < total && !self.config.throttle.is_zero() {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        termination = RunTermination::Cancelled;
                        break;
                    }
                    _ = tokio::time::sleep(self.config.throttle) => {}
                }
            }
        }

        self.finish(termination)
    }

    /// One attempt: first send, then a single retry from the same sender on failure
    async fn attempt(&mut self, attempted: u32, sender: SenderIdentity) {
        let first = self.send(&sender).await;
        let error = match first {
            Ok(id) => {
                self.sent += 1;
                self.metrics.inc_sent();
                self.record(attempted, &sender, AttemptOutcome::Sent, Some(id), None);
                return;
            }
            Err(error) => error,
        };

        debug!(sender = %sender, error = %error, "First send failed, retrying");
        self.metrics.inc_retries();
        self.record(attempted, &sender, AttemptOutcome::Failed, None, Some(&error));

        if !self.config.retry_backoff.is_zero() {
            tokio::time::sleep(self.config.retry_backoff).await;
        }

        match self.send(&sender).await {
            Ok(id) => {
                self.sent += 1;
                self.metrics.inc_sent();
                self.record(attempted, &sender, AttemptOutcome::RetrySent, Some(id), None);
            }
            Err(error) => {
                self.failed += 1;
                self.metrics.inc_failed();
                self.record(attempted, &sender, AttemptOutcome::RetryFailed, None, Some(&error));
            }
        }
    }

    async fn send(&self, sender: &SenderIdentity) -> Result<MessageId, TransportError> {
        let started = Instant::now();
        let result = self
            .transport
            .send(sender, self.request.recipient(), &self.config.payload)
            .await;
        observability::record_send_latency_ms(
            self.config.channel,
            started.elapsed().as_secs_f64() * 1000.0,
        );
        result
    }

    /// Log record first, then the progress event
    fn record(
        &mut self,
        attempted: u32,
        sender: &SenderIdentity,
        outcome: AttemptOutcome,
        message_id: Option<MessageId>,
        error: Option<&TransportError>,
    ) {
        let reason = error.map(ToString::to_string);

        if let Some(logger) = self.logger.as_mut() {
            let mut record = LogRecord::now(outcome, sender.clone(), self.request.recipient());
            record.message_id = message_id;
            record.reason = reason.clone();

            if let Err(err) = logger.append(&record) {
                warn!(path = %err.path.display(), error = %err, "Run log write failed");
                self.metrics.inc_log_failures();
                observability::record_log_write_failure(self.config.channel);
                let _ = self.log_errors.send(err);
            }
        }

        observability::record_attempt(self.config.channel, outcome);

        let event = ProgressEvent {
            sent_so_far: self.sent,
            attempted_so_far: attempted,
            sender: sender.clone(),
            recipient: self.request.recipient().to_string(),
            outcome,
            failure_reason: reason,
        };
        // Nobody listening is fine
        let _ = self.events.send(RunEvent::Progress(event));
    }

    fn finish(self, termination: RunTermination) -> RunReport {
        let summary = RunSummary {
            total_sent: self.sent,
            total_failed: self.failed,
        };
        let log_path = self
            .logger
            .as_ref()
            .filter(|logger| logger.is_created())
            .map(|logger| logger.path().to_path_buf());

        observability::record_run_finished(self.config.channel, termination, &summary);
        info!(
            termination = termination.as_str(),
            sent = summary.total_sent,
            failed = summary.total_failed,
            "Run finished"
        );

        let report = RunReport {
            summary,
            termination,
            log_path,
        };

        self.state.send_replace(termination.into());
        let _ = self.events.send(RunEvent::Finished(report.clone()));
        report
    }
}

// A run task that panics or is aborted never reaches `finish`; without this
// the worker would report `Running` forever.
impl<T> Drop for Run<T> {
    fn drop(&mut self) {
        let state = *self.state.borrow();
        if !state.is_terminal() {
            warn!(state = ?state, "Run task ended abnormally, marking run cancelled");
            self.state.send_replace(WorkerState::Cancelled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::RotationPolicy;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;
    use transport::{ScriptedTransport, SimulatedConfig, SimulatedTransport};

    const RECIPIENT: &str = "+447700900999";

    fn senders(n: usize) -> Vec<SenderIdentity> {
        (1..=n)
            .map(|i| SenderIdentity::from(format!("+44770090000{i}")))
            .collect()
    }

    fn worker<T: Transport + Sync + 'static>(
        pool: SenderPool,
        transport: T,
        dir: &TempDir,
    ) -> DispatchWorker<T> {
        DispatchWorker::new(
            pool,
            transport,
            WorkerConfig::immediate(ChannelKind::Sms, dir.path()),
        )
    }

    fn request(count: u32, logging: bool) -> DispatchRequest {
        DispatchRequest::new(RECIPIENT, count, logging).unwrap()
    }

    fn log_lines(path: &std::path::Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_round_robin_all_sent() {
        let dir = TempDir::new().unwrap();
        let pool = SenderPool::round_robin(senders(2)).unwrap();
        let mut worker = worker(pool, SimulatedTransport::reliable(), &dir);

        let run = worker.start(request(3, true)).unwrap().collect().await.unwrap();

        let order: Vec<_> = run.progress.iter().map(|e| e.sender.to_string()).collect();
        assert_eq!(order, ["+447700900001", "+447700900002", "+447700900001"]);
        assert!(run.progress.iter().all(|e| e.outcome == AttemptOutcome::Sent));
        assert_eq!(
            run.progress.iter().map(|e| e.sent_so_far).collect::<Vec<_>>(),
            [1, 2, 3]
        );
        assert_eq!(run.report.summary, RunSummary { total_sent: 3, total_failed: 0 });
        assert_eq!(run.report.termination, RunTermination::Completed);
        assert_eq!(worker.state(), WorkerState::Completed);

        let lines = log_lines(run.report.log_path.as_deref().unwrap());
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.starts_with("SENT: ")));
    }

    #[tokio::test]
    async fn test_retry_same_sender_then_failure() {
        let dir = TempDir::new().unwrap();
        let script = ScriptedTransport::new()
            .succeed()
            .fail("carrier rejected")
            .fail("carrier rejected again")
            .succeed();
        let pool = SenderPool::round_robin(senders(1)).unwrap();
        let mut worker = worker(pool, script.clone(), &dir);

        let run = worker.start(request(3, true)).unwrap().collect().await.unwrap();

        let outcomes: Vec<_> = run.progress.iter().map(|e| e.outcome).collect();
        assert_eq!(
            outcomes,
            [
                AttemptOutcome::Sent,
                AttemptOutcome::Failed,
                AttemptOutcome::RetryFailed,
                AttemptOutcome::Sent
            ]
        );
        assert_eq!(run.report.summary, RunSummary { total_sent: 2, total_failed: 1 });

        let calls = script.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[1].sender, calls[2].sender);

        let failed = &run.progress[2];
        assert_eq!(failed.attempted_so_far, 2);
        assert_eq!(failed.failure_reason.as_deref(), Some("carrier rejected again"));

        let lines = log_lines(run.report.log_path.as_deref().unwrap());
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("FAILED: "));
        assert!(lines[2].starts_with("RETRY_FAILED: "));
        assert!(lines[2].ends_with("Reason: carrier rejected again"));
    }

    #[tokio::test]
    async fn test_retry_success_counts_as_sent() {
        let dir = TempDir::new().unwrap();
        let script = ScriptedTransport::new().fail("busy").succeed();
        let pool = SenderPool::round_robin(senders(1)).unwrap();
        let mut worker = worker(pool, script, &dir);

        let run = worker.start(request(1, false)).unwrap().collect().await.unwrap();

        let terminal: Vec<_> = run.terminal_progress().collect();
        assert_eq!(terminal.len(), 1);
        assert_eq!(terminal[0].outcome, AttemptOutcome::RetrySent);
        assert_eq!(terminal[0].sent_so_far, 1);
        assert_eq!(run.report.summary, RunSummary { total_sent: 1, total_failed: 0 });
        assert_eq!(worker.metrics().retries, 1);
    }

    #[tokio::test]
    async fn test_counts_always_balance() {
        let dir = TempDir::new().unwrap();
        let transport = SimulatedTransport::new(SimulatedConfig {
            failure_rate: 0.5,
            seed: Some(7),
            ..Default::default()
        })
        .unwrap();
        let pool = SenderPool::random_choice(senders(3), StdRng::seed_from_u64(3)).unwrap();
        let mut worker = worker(pool, transport, &dir);

        let run = worker.start(request(25, false)).unwrap().collect().await.unwrap();

        assert_eq!(run.terminal_progress().count(), 25);
        assert_eq!(run.report.summary.attempts(), 25);
        let mut last_sent = 0;
        for event in &run.progress {
            assert!(event.sent_so_far >= last_sent);
            assert!(event.sent_so_far <= event.attempted_so_far);
            last_sent = event.sent_so_far;
        }
        let snap = worker.metrics();
        assert_eq!(snap.sent, run.report.summary.total_sent);
        assert_eq!(snap.failed, run.report.summary.total_failed);
    }

    #[tokio::test]
    async fn test_logging_disabled_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let pool = SenderPool::round_robin(senders(1)).unwrap();
        let mut worker = worker(pool, SimulatedTransport::reliable(), &dir);

        let report = worker.start(request(2, false)).unwrap().wait().await.unwrap();

        assert!(report.log_path.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_log_failure_does_not_abort_run() {
        let dir = TempDir::new().unwrap();
        // A regular file where the log directory should be
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"").unwrap();

        let pool = SenderPool::round_robin(senders(1)).unwrap();
        let mut worker = DispatchWorker::new(
            pool,
            SimulatedTransport::reliable(),
            WorkerConfig::immediate(ChannelKind::Sms, &blocker),
        );

        let run = worker.start(request(2, true)).unwrap().collect().await.unwrap();

        assert_eq!(run.report.summary.total_sent, 2);
        assert_eq!(run.report.termination, RunTermination::Completed);
        assert!(run.report.log_path.is_none());
        assert_eq!(run.log_errors.len(), 2);
        assert_eq!(worker.metrics().log_failures, 2);
    }

    #[tokio::test]
    async fn test_start_twice_rejected() {
        let dir = TempDir::new().unwrap();
        let pool = SenderPool::round_robin(senders(1)).unwrap();
        let mut worker = worker(pool, SimulatedTransport::reliable(), &dir);

        let handle = worker.start(request(1, false)).unwrap();
        let err = worker.start(request(1, false)).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidState { .. }));

        handle.wait().await.unwrap();
        let err = worker.start(request(1, false)).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::InvalidState { state: WorkerState::Completed }
        ));
    }

    #[tokio::test]
    async fn test_stop_before_start_is_noop() {
        let dir = TempDir::new().unwrap();
        let pool = SenderPool::round_robin(senders(1)).unwrap();
        let mut worker = worker(pool, SimulatedTransport::reliable(), &dir);

        worker.stop();
        assert_eq!(worker.state(), WorkerState::Idle);

        let report = worker.start(request(2, false)).unwrap().wait().await.unwrap();
        assert_eq!(report.termination, RunTermination::Completed);
        assert_eq!(report.summary.total_sent, 2);
    }

    #[tokio::test]
    async fn test_stop_immediately_after_start() {
        let dir = TempDir::new().unwrap();
        let pool = SenderPool::round_robin(senders(1)).unwrap();
        let transport = ScriptedTransport::new();
        let mut worker = worker(pool, transport.clone(), &dir);

        let handle = worker.start(request(50, false)).unwrap();
        worker.stop();
        worker.stop();

        let report = handle.wait().await.unwrap();
        assert_eq!(report.termination, RunTermination::Cancelled);
        assert_eq!(report.summary.attempts(), 0);
        assert_eq!(transport.call_count(), 0);
        assert_eq!(worker.wait_terminal().await, WorkerState::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_throttle_ends_run() {
        let dir = TempDir::new().unwrap();
        let pool = SenderPool::round_robin(senders(2)).unwrap();
        let transport = ScriptedTransport::new();
        let mut worker = DispatchWorker::new(
            pool,
            transport.clone(),
            WorkerConfig {
                throttle: Duration::from_millis(100),
                ..WorkerConfig::immediate(ChannelKind::Sms, dir.path())
            },
        );
        let stop = worker.stop_handle();

        let mut handle = worker.start(request(10, false)).unwrap();
        let mut terminal = 0;
        let report = loop {
            match handle.next_event().await {
                Some(RunEvent::Progress(p)) if p.outcome.is_terminal() => {
                    terminal += 1;
                    if terminal == 3 {
                        stop.stop();
                    }
                }
                Some(RunEvent::Progress(_)) => {}
                Some(RunEvent::Finished(report)) => break report,
                None => panic!("run ended without Finished"),
            }
        };

        assert!(report.was_cancelled());
        assert_eq!(report.summary.attempts(), 3);
        assert_eq!(transport.call_count(), 3);
        assert_eq!(stop.state(), WorkerState::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_spacing() {
        let dir = TempDir::new().unwrap();
        let pool = SenderPool::round_robin(senders(1)).unwrap();
        let mut worker = DispatchWorker::new(
            pool,
            SimulatedTransport::reliable(),
            WorkerConfig {
                throttle: Duration::from_millis(100),
                ..WorkerConfig::immediate(ChannelKind::Sms, dir.path())
            },
        );

        let started = tokio::time::Instant::now();
        let report = worker.start(request(4, false)).unwrap().wait().await.unwrap();

        // Three gaps; none after the last attempt
        assert_eq!(started.elapsed(), Duration::from_millis(300));
        assert_eq!(report.summary.total_sent, 4);
    }

    #[test]
    fn test_worker_config_from_settings() {
        let mut settings = DeliverySettings::default();
        settings.message.channel = ChannelKind::Email;
        settings.senders.policy = RotationPolicy::SyntheticGenerate;
        settings.timing.throttle_ms = 0;

        let config = WorkerConfig::from_settings(&settings);
        assert_eq!(config.channel, ChannelKind::Email);
        assert!(config.throttle.is_zero());
        assert_eq!(config.retry_backoff, Duration::from_millis(1000));
    }

    struct PanickingTransport;

    impl Transport for PanickingTransport {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn send(
            &self,
            _sender: &SenderIdentity,
            _recipient: &str,
            _payload: &MessagePayload,
        ) -> Result<MessageId, TransportError> {
            panic!("transport exploded")
        }
    }

    #[tokio::test]
    async fn test_panicked_run_does_not_stay_running() {
        let dir = TempDir::new().unwrap();
        let pool = SenderPool::round_robin(senders(1)).unwrap();
        let mut worker = worker(pool, PanickingTransport, &dir);

        let err = worker.start(request(3, false)).unwrap().wait().await.unwrap_err();
        assert!(matches!(err, DispatchError::Join(_)));
        assert_eq!(worker.state(), WorkerState::Cancelled);
        assert_eq!(worker.wait_terminal().await, WorkerState::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_retry_backoff_waits_for_retry() {
        let dir = TempDir::new().unwrap();
        let pool = SenderPool::round_robin(senders(1)).unwrap();
        let transport = ScriptedTransport::new().fail("busy").succeed();
        let mut worker = DispatchWorker::new(
            pool,
            transport.clone(),
            WorkerConfig {
                retry_backoff: Duration::from_millis(1000),
                ..WorkerConfig::immediate(ChannelKind::Sms, dir.path())
            },
        );

        let started = tokio::time::Instant::now();
        let mut handle = worker.start(request(5, false)).unwrap();
        let mut progress = Vec::new();
        let report = loop {
            match handle.next_event().await {
                Some(RunEvent::Progress(event)) => {
                    if event.outcome == AttemptOutcome::Failed {
                        // Run is now parked in the backoff
                        worker.stop();
                    }
                    progress.push(event);
                }
                Some(RunEvent::Finished(report)) => break report,
                None => panic!("run ended without Finished"),
            }
        };

        // The backoff ran to completion and the retry still went out
        assert_eq!(started.elapsed(), Duration::from_millis(1000));
        assert_eq!(transport.call_count(), 2);
        let outcomes: Vec<_> = progress.iter().map(|e| e.outcome).collect();
        assert_eq!(outcomes, [AttemptOutcome::Failed, AttemptOutcome::RetrySent]);
        assert!(progress.iter().all(|e| e.attempted_so_far == 1));

        assert_eq!(report.termination, RunTermination::Cancelled);
        assert_eq!(report.summary, RunSummary { total_sent: 1, total_failed: 0 });
    }

    #[tokio::test]
    async fn test_wait_terminal_on_unstarted_worker_returns_idle() {
        let dir = TempDir::new().unwrap();
        let pool = SenderPool::round_robin(senders(1)).unwrap();
        let worker = worker(pool, SimulatedTransport::reliable(), &dir);

        assert_eq!(worker.wait_terminal().await, WorkerState::Idle);
    }
}
