//! Per-attempt progress and end-of-run summary

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::SenderIdentity;

/// Result of one send within an attempt.
///
/// `Failed` is the observation of a first send failing; it is always
/// followed by `RetrySent` or `RetryFailed` for the same attempt. The other
/// three variants are terminal: each attempt ends in exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Sent,
    Failed,
    RetrySent,
    RetryFailed,
}

impl AttemptOutcome {
    /// Whether the attempt is over once this outcome is reported
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Failed)
    }

    /// Whether the message got through
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Sent | Self::RetrySent)
    }

    /// Status word used in run log lines
    pub fn status_label(&self) -> &'static str {
        match self {
            Self::Sent => "SENT",
            Self::Failed => "FAILED",
            Self::RetrySent => "RETRY_SENT",
            Self::RetryFailed => "RETRY_FAILED",
        }
    }

    /// Metric label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::RetrySent => "retry_sent",
            Self::RetryFailed => "retry_failed",
        }
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status_label())
    }
}

/// One progress report, emitted in attempt order by the single run producer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Messages delivered so far, this event included
    pub sent_so_far: u32,
    /// 1-based index of the attempt this event belongs to
    pub attempted_so_far: u32,
    pub sender: SenderIdentity,
    pub recipient: String,
    pub outcome: AttemptOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

/// Final tally of a run.
///
/// An attempt ending in `RetrySent` counts as sent, one ending in
/// `RetryFailed` counts as failed, so `total_sent + total_failed` always
/// equals the number of attempts made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_sent: u32,
    pub total_failed: u32,
}

impl RunSummary {
    pub fn attempts(&self) -> u32 {
        self.total_sent + self.total_failed
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sent: {}, Failed: {}", self.total_sent, self.total_failed)
    }
}

/// How a started run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTermination {
    /// Every requested attempt was made
    Completed,
    /// `stop()` was observed before the attempts ran out
    Cancelled,
}

impl RunTermination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}
