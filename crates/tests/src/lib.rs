//! # Integration Tests
//!
//! Cross-crate end-to-end tests.
//!
//! Covers:
//! - Settings text -> controller -> worker -> run log file
//! - Retry path and summary arithmetic
//! - Cancellation from another task
//! - Rejection before any run exists

#[cfg(test)]
mod contract_tests {
    use contracts::{AttemptOutcome, ChannelKind};

    #[test]
    fn test_status_labels_are_stable() {
        let labels: Vec<_> = [
            AttemptOutcome::Sent,
            AttemptOutcome::Failed,
            AttemptOutcome::RetrySent,
            AttemptOutcome::RetryFailed,
        ]
        .iter()
        .map(AttemptOutcome::status_label)
        .collect();
        assert_eq!(labels, ["SENT", "FAILED", "RETRY_SENT", "RETRY_FAILED"]);
        assert_eq!(ChannelKind::Sms.log_prefix(), "sms");
        assert_eq!(ChannelKind::Email.log_prefix(), "email");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::Path;
    use std::time::Duration;

    use config_loader::{resolve_identities, ConfigFormat, ConfigLoader};
    use contracts::{AttemptOutcome, DeliverySettings, RunSummary, RunTermination, Transport};
    use dispatcher::{DispatchController, RunEvent, StartedRun, WorkerConfig, WorkerState};
    use tempfile::TempDir;
    use transport::{ScriptedTransport, SimulatedTransport};

    const SMS_RECIPIENT: &str = "+447700900999";

    /// Settings text with the log directory pointed at `dir`
    fn settings(toml: &str, dir: &Path) -> DeliverySettings {
        let mut settings = ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap();
        settings.logging.directory = dir.to_path_buf();
        settings
    }

    fn controller(settings: &DeliverySettings) -> DispatchController {
        let identities = resolve_identities(&settings.senders, None).unwrap();
        DispatchController::new(
            WorkerConfig::from_settings(settings),
            settings.senders.policy,
            identities,
            settings.logging.enabled,
        )
        .with_seed(settings.senders.seed)
    }

    fn read_log(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    const ROUND_ROBIN: &str = r#"
[message]
channel = "sms"

[senders]
policy = "round_robin"
identities = ["+447700900001", "+447700900002"]

[timing]
throttle_ms = 0
retry_backoff_ms = 0
"#;

    /// Settings -> controller -> worker -> log file
    #[tokio::test]
    async fn test_e2e_round_robin_run_log() {
        let dir = TempDir::new().unwrap();
        let settings = settings(ROUND_ROBIN, dir.path());

        let StartedRun { worker, handle } = controller(&settings)
            .start(SMS_RECIPIENT, 3, SimulatedTransport::reliable())
            .unwrap();
        let run = handle.collect().await.unwrap();

        assert_eq!(run.report.summary, RunSummary { total_sent: 3, total_failed: 0 });
        assert_eq!(run.report.termination, RunTermination::Completed);
        assert_eq!(worker.state(), WorkerState::Completed);

        let path = run.report.log_path.clone().unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("sms_") && name.ends_with(".log"), "{name}");

        let mut aggregator = observability::OutcomeAggregator::new();
        run.progress.iter().for_each(|e| aggregator.update(e));
        let summary = aggregator.summary();
        assert_eq!(summary.sent, 3);
        assert_eq!(summary.per_sender["+447700900001"].sent, 2);
        assert_eq!(summary.per_sender["+447700900002"].sent, 1);

        let lines = read_log(&path);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("SENT: +447700900001 -> +447700900999 ["));
        assert!(lines[1].starts_with("SENT: +447700900002 -> +447700900999 ["));
        assert!(lines[2].starts_with("SENT: +447700900001 -> +447700900999 ["));
    }

    /// One success, one double failure, one success
    #[tokio::test]
    async fn test_e2e_retry_failure_summary() {
        let dir = TempDir::new().unwrap();
        let settings = settings(ROUND_ROBIN, dir.path());
        let script = ScriptedTransport::new()
            .succeed()
            .fail("queue full")
            .fail("queue still full")
            .succeed();

        let started = controller(&settings)
            .start(SMS_RECIPIENT, 3, script.clone())
            .unwrap();
        let run = started.handle.collect().await.unwrap();

        assert_eq!(run.report.summary, RunSummary { total_sent: 2, total_failed: 1 });
        assert_eq!(run.terminal_progress().count(), 3);

        // Retry reuses the sender of the failed first send
        let calls = script.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[1].sender, "+447700900002");
        assert_eq!(calls[2].sender, "+447700900002");
        assert_eq!(calls[3].sender, "+447700900001");

        let outcomes: Vec<_> = run.progress.iter().map(|e| e.outcome).collect();
        assert_eq!(
            outcomes,
            [
                AttemptOutcome::Sent,
                AttemptOutcome::Failed,
                AttemptOutcome::RetryFailed,
                AttemptOutcome::Sent,
            ]
        );

        let lines = read_log(run.report.log_path.as_deref().unwrap());
        let statuses: Vec<_> = lines
            .iter()
            .map(|l| l.split(':').next().unwrap().to_string())
            .collect();
        assert_eq!(statuses, ["SENT", "FAILED", "RETRY_FAILED", "SENT"]);
    }

    /// Stop from another task while the run waits out its throttle
    #[tokio::test(start_paused = true)]
    async fn test_e2e_stop_from_another_task() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings(ROUND_ROBIN, dir.path());
        settings.timing.throttle_ms = 250;
        let transport = ScriptedTransport::new();

        let StartedRun { worker, mut handle } = controller(&settings)
            .start(SMS_RECIPIENT, 20, transport.clone())
            .unwrap();
        let stop = worker.stop_handle();

        let mut seen = 0;
        let report = loop {
            match handle.next_event().await {
                Some(RunEvent::Progress(event)) if event.outcome.is_terminal() => {
                    seen += 1;
                    if seen == 2 {
                        let stop = stop.clone();
                        tokio::spawn(async move { stop.stop() }).await.unwrap();
                    }
                }
                Some(RunEvent::Progress(_)) => {}
                Some(RunEvent::Finished(report)) => break report,
                None => panic!("event channel closed before Finished"),
            }
        };

        assert_eq!(report.termination, RunTermination::Cancelled);
        assert_eq!(report.summary.attempts(), 2);
        assert_eq!(transport.call_count(), 2);
        assert_eq!(read_log(report.log_path.as_deref().unwrap()).len(), 2);
        assert_eq!(worker.wait_terminal().await, WorkerState::Cancelled);

        // Stopping a finished run changes nothing
        stop.stop();
        assert_eq!(worker.state(), WorkerState::Cancelled);
    }

    /// Rejected input leaves no run and no log file behind
    #[tokio::test]
    async fn test_e2e_invalid_email_recipient() {
        let dir = TempDir::new().unwrap();
        let settings = settings(
            r#"
[message]
channel = "email"
subject = "Delivery test"

[senders]
policy = "synthetic_generate"
"#,
            dir.path(),
        );
        let transport = ScriptedTransport::new();

        let err = controller(&settings)
            .start("not-an-address", 3, transport.clone())
            .err()
            .unwrap();

        assert!(err.is_validation());
        assert_eq!(transport.call_count(), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_e2e_empty_pool_rejected() {
        let dir = TempDir::new().unwrap();
        let settings = settings(
            r#"
[senders]
policy = "random_choice"
"#,
            dir.path(),
        );

        let err = controller(&settings)
            .start(SMS_RECIPIENT, 1, SimulatedTransport::reliable())
            .err()
            .unwrap();
        assert!(err.is_configuration());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    /// Email run with fabricated senders and throttling under paused time
    #[tokio::test(start_paused = true)]
    async fn test_e2e_email_synthetic_with_throttle() {
        let dir = TempDir::new().unwrap();
        let settings = settings(
            r#"
[message]
channel = "email"

[senders]
policy = "synthetic_generate"
seed = 42

[timing]
throttle_ms = 100
retry_backoff_ms = 0
"#,
            dir.path(),
        );

        let started_at = tokio::time::Instant::now();
        let started = controller(&settings)
            .start("someone@example.org", 4, SimulatedTransport::reliable())
            .unwrap();
        let run = started.handle.collect().await.unwrap();

        assert_eq!(started_at.elapsed(), Duration::from_millis(300));
        assert_eq!(run.report.summary.total_sent, 4);
        for event in &run.progress {
            assert!(event.sender.starts_with("delivery-test-"));
            assert!(event.sender.ends_with("@example.com"));
        }

        let path = run.report.log_path.unwrap();
        assert!(path
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("email_"));
    }

    #[test]
    fn test_transport_is_object_of_choice() {
        fn assert_transport<T: Transport + Sync + 'static>() {}
        assert_transport::<SimulatedTransport>();
        assert_transport::<ScriptedTransport>();
    }
}
