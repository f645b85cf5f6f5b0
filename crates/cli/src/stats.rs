//! Run statistics and the closing summary.

use std::time::Instant;

use anyhow::Context;
use contracts::ProgressEvent;
use dispatcher::{MetricsSnapshot, RunReport};
use observability::OutcomeAggregator;
use serde::Serialize;

/// Statistics gathered while a run's events stream in
#[derive(Debug)]
pub struct DeliveryStats {
    requested: u32,
    started: Instant,
    last_terminal: Option<Instant>,
    aggregator: OutcomeAggregator,
}

#[derive(Serialize)]
struct JsonSummary<'a> {
    termination: &'a str,
    requested: u32,
    total_sent: u32,
    total_failed: u32,
    retries: u32,
    log_failures: u64,
    duration_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_path: Option<String>,
}

impl DeliveryStats {
    pub fn new(requested: u32) -> Self {
        Self {
            requested,
            started: Instant::now(),
            last_terminal: None,
            aggregator: OutcomeAggregator::new(),
        }
    }

    pub fn observe(&mut self, event: &ProgressEvent) {
        self.aggregator.update(event);
        if event.outcome.is_terminal() {
            let now = Instant::now();
            if let Some(prev) = self.last_terminal.replace(now) {
                self.aggregator
                    .observe_gap_ms(now.duration_since(prev).as_secs_f64() * 1000.0);
            }
        }
    }

    pub fn print_summary(
        &self,
        report: &RunReport,
        metrics: MetricsSnapshot,
        json: bool,
    ) -> anyhow::Result<()> {
        let duration = self.started.elapsed();

        if json {
            let summary = JsonSummary {
                termination: report.termination.as_str(),
                requested: self.requested,
                total_sent: report.summary.total_sent,
                total_failed: report.summary.total_failed,
                retries: metrics.retries,
                log_failures: metrics.log_failures,
                duration_secs: duration.as_secs_f64(),
                log_path: report.log_path.as_ref().map(|p| p.display().to_string()),
            };
            let line = serde_json::to_string(&summary).context("Failed to serialize run summary")?;
            println!("{line}");
            return Ok(());
        }

        println!();
        if report.was_cancelled() {
            println!(
                "Run stopped by user after {} of {} attempts",
                report.summary.attempts(),
                self.requested
            );
        } else {
            println!("Run completed");
        }
        println!("{}", report.summary);
        println!("Duration: {:.2}s", duration.as_secs_f64());
        if metrics.log_failures > 0 {
            println!("Run log write failures: {}", metrics.log_failures);
        }
        match &report.log_path {
            Some(path) => println!("Log file: {}", path.display()),
            None => println!("Log file: none"),
        }
        println!();
        print!("{}", self.aggregator.summary());
        Ok(())
    }
}
