//! Scripted transport
//!
//! Test double: results are taken from a FIFO script, one per call, and every
//! call is journaled. Clones share the script and journal, so a test can keep
//! a clone after moving the transport into a worker.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contracts::{MessageId, MessagePayload, SenderIdentity, Transport, TransportError};
use tracing::instrument;

/// One journaled send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedCall {
    pub sender: SenderIdentity,
    pub recipient: String,
    pub body: String,
}

#[derive(Debug, Default)]
struct ScriptState {
    script: VecDeque<Result<(), String>>,
    /// Used once the script runs dry; `None` means succeed
    fallback_failure: Option<String>,
    calls: Vec<ScriptedCall>,
}

/// Transport returning pre-programmed results
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<ScriptState>>,
    latency: Duration,
}

impl ScriptedTransport {
    /// Transport that succeeds until told otherwise
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport whose every unscripted call fails with `reason`
    pub fn failing(reason: impl Into<String>) -> Self {
        let transport = Self::new();
        transport.lock().fallback_failure = Some(reason.into());
        transport
    }

    /// Queue a success
    pub fn succeed(self) -> Self {
        self.lock().script.push_back(Ok(()));
        self
    }

    /// Queue a failure
    pub fn fail(self, reason: impl Into<String>) -> Self {
        self.lock().script.push_back(Err(reason.into()));
        self
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Journal of all calls so far
    pub fn calls(&self) -> Vec<ScriptedCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, sender: &SenderIdentity, recipient: &str, payload: &MessagePayload) -> (usize, Result<(), String>) {
        let mut state = self.lock();
        state.calls.push(ScriptedCall {
            sender: sender.clone(),
            recipient: recipient.to_string(),
            body: payload.body.clone(),
        });
        let result = match state.script.pop_front() {
            Some(result) => result,
            None => match &state.fallback_failure {
                Some(reason) => Err(reason.clone()),
                None => Ok(()),
            },
        };
        (state.calls.len(), result)
    }
}

impl Transport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    #[instrument(
        name = "scripted_transport_send",
        skip(self, payload),
        fields(sender = %sender)
    )]
    async fn send(
        &self,
        sender: &SenderIdentity,
        recipient: &str,
        payload: &MessagePayload,
    ) -> Result<MessageId, TransportError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let (call_no, result) = self.record(sender, recipient, payload);
        result
            .map(|()| MessageId::new(format!("SCRIPT{call_no:04}")))
            .map_err(TransportError::rejected)
    }
}
