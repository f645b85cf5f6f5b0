//! Transport trait - dispatcher output interface
//!
//! Abstracts the messaging service a run delivers through.

use crate::{MessageId, MessagePayload, SenderIdentity, TransportError};

/// Capability to attempt delivery of one message.
///
/// Network-backed and simulated implementations are interchangeable behind
/// this trait; the dispatcher never knows which one it holds.
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    /// Transport name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Attempt delivery of `payload` from `sender` to `recipient`.
    ///
    /// # Errors
    /// Returns a transport error describing why this single attempt failed.
    async fn send(
        &self,
        sender: &SenderIdentity,
        recipient: &str,
        payload: &MessagePayload,
    ) -> Result<MessageId, TransportError>;
}
