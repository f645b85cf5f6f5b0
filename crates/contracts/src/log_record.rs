//! LogRecord - one line of a run log

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::{AttemptOutcome, MessageId, SenderIdentity};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// A single appended record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub outcome: AttemptOutcome,
    pub sender: SenderIdentity,
    pub recipient: String,
    /// Failure reason, for `Failed` / `RetryFailed`
    #[serde(default)]
    pub reason: Option<String>,
    /// Service message id, for `Sent` / `RetrySent`
    #[serde(default)]
    pub message_id: Option<MessageId>,
}

impl LogRecord {
    /// Record stamped with the current local time
    pub fn now(outcome: AttemptOutcome, sender: SenderIdentity, recipient: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            outcome,
            sender,
            recipient: recipient.into(),
            reason: None,
            message_id: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_message_id(mut self, id: MessageId) -> Self {
        self.message_id = Some(id);
        self
    }

    /// Render as `STATUS: sender -> recipient [timestamp] extra` (no newline)
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "{}: {} -> {} [{}]",
            self.outcome.status_label(),
            self.sender,
            self.recipient,
            self.timestamp.format(TIMESTAMP_FORMAT)
        );
        if let Some(id) = &self.message_id {
            line.push_str(" SID: ");
            line.push_str(id.as_str());
        }
        if let Some(reason) = &self.reason {
            line.push_str(" Reason: ");
            line.push_str(&single_line(reason));
        }
        line
    }
}

// A reason spanning lines would break the one-record-per-line layout
fn single_line(text: &str) -> String {
    text.lines().map(str::trim).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_sent_line() {
        let mut record = LogRecord::now(AttemptOutcome::Sent, "+447700900001".into(), "+447700900999")
            .with_message_id(MessageId::new("SM42"));
        record.timestamp = fixed_time();

        assert_eq!(
            record.to_line(),
            "SENT: +447700900001 -> +447700900999 [2024-05-01 09:30:00.000] SID: SM42"
        );
    }

    #[test]
    fn test_failure_line_keeps_reason_on_one_line() {
        let mut record = LogRecord::now(AttemptOutcome::RetryFailed, "a@example.com".into(), "b@example.com")
            .with_reason("mailbox full\n  try later");
        record.timestamp = fixed_time();

        let line = record.to_line();
        assert!(line.starts_with("RETRY_FAILED: a@example.com -> b@example.com ["));
        assert!(line.ends_with("Reason: mailbox full try later"));
        assert!(!line.contains('\n'));
    }
}
