//! Delivery metrics
//!
//! Prometheus-style counters for attempts and runs, plus an in-memory
//! aggregator that folds progress events into a printable summary.

use std::collections::BTreeMap;

use contracts::{AttemptOutcome, ChannelKind, ProgressEvent, RunSummary, RunTermination};
use metrics::{counter, histogram};

/// Record one reported outcome
pub fn record_attempt(channel: ChannelKind, outcome: AttemptOutcome) {
    counter!(
        "delivery_attempts_total",
        "channel" => channel.log_prefix(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record wall time of one transport call
pub fn record_send_latency_ms(channel: ChannelKind, latency_ms: f64) {
    histogram!("delivery_send_latency_ms", "channel" => channel.log_prefix()).record(latency_ms);
}

/// Record a run log append failure
pub fn record_log_write_failure(channel: ChannelKind) {
    counter!("delivery_log_write_failures_total", "channel" => channel.log_prefix()).increment(1);
}

/// Record the end of a run
pub fn record_run_finished(channel: ChannelKind, termination: RunTermination, summary: &RunSummary) {
    counter!(
        "delivery_runs_total",
        "channel" => channel.log_prefix(),
        "termination" => termination.as_str()
    )
    .increment(1);
    counter!("delivery_messages_sent_total", "channel" => channel.log_prefix())
        .increment(u64::from(summary.total_sent));
    counter!("delivery_messages_failed_total", "channel" => channel.log_prefix())
        .increment(u64::from(summary.total_failed));
}

/// Per-sender outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SenderTally {
    pub sent: u64,
    pub failed: u64,
    pub retried: u64,
}

/// Outcome aggregator
///
/// Keeps running totals over a run's progress events.
#[derive(Debug, Clone, Default)]
pub struct OutcomeAggregator {
    /// Terminal outcomes seen
    pub attempts: u64,
    pub sent: u64,
    pub failed: u64,
    /// Attempts that needed the retry
    pub retried: u64,
    /// Gaps between consecutive terminal events (ms)
    pub gap_stats: RunningStats,
    /// Sorted by sender for stable output
    pub per_sender: BTreeMap<String, SenderTally>,
}

impl OutcomeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event in
    pub fn update(&mut self, event: &ProgressEvent) {
        let tally = self.per_sender.entry(event.sender.to_string()).or_default();
        match event.outcome {
            AttemptOutcome::Failed => {
                self.retried += 1;
                tally.retried += 1;
                return;
            }
            AttemptOutcome::Sent | AttemptOutcome::RetrySent => {
                self.sent += 1;
                tally.sent += 1;
            }
            AttemptOutcome::RetryFailed => {
                self.failed += 1;
                tally.failed += 1;
            }
        }
        self.attempts += 1;
    }

    /// Record the time since the previous terminal event
    pub fn observe_gap_ms(&mut self, gap_ms: f64) {
        self.gap_stats.push(gap_ms);
    }

    pub fn summary(&self) -> OutcomeSummary {
        OutcomeSummary {
            attempts: self.attempts,
            sent: self.sent,
            failed: self.failed,
            retried: self.retried,
            success_rate: if self.attempts > 0 {
                self.sent as f64 / self.attempts as f64 * 100.0
            } else {
                0.0
            },
            gap_ms: StatsSummary::from(&self.gap_stats),
            per_sender: self.per_sender.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Aggregated outcome summary
#[derive(Debug, Clone, Default)]
pub struct OutcomeSummary {
    pub attempts: u64,
    pub sent: u64,
    pub failed: u64,
    pub retried: u64,
    pub success_rate: f64,
    pub gap_ms: StatsSummary,
    pub per_sender: BTreeMap<String, SenderTally>,
}

impl std::fmt::Display for OutcomeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Delivery Summary ===")?;
        writeln!(f, "Attempts: {}", self.attempts)?;
        writeln!(f, "Sent: {} ({:.2}%)", self.sent, self.success_rate)?;
        writeln!(f, "Failed: {}", self.failed)?;
        writeln!(f, "Retried: {}", self.retried)?;
        writeln!(f, "Gap between attempts (ms): {}", self.gap_ms)?;

        if !self.per_sender.is_empty() {
            writeln!(f, "Per sender:")?;
            for (sender, tally) in &self.per_sender {
                writeln!(
                    f,
                    "  {}: sent={} failed={} retried={}",
                    sender, tally.sent, tally.failed, tally.retried
                )?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
