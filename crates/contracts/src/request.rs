//! DispatchRequest - what the Control Surface asks a run to do

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Default message body used when the configuration does not provide one
pub const DEFAULT_MESSAGE_BODY: &str = "Delivery test message";

/// Immutable description of one run.
///
/// Fields are private so a request cannot change after the run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchRequest {
    recipient: String,
    attempt_count: u32,
    logging_enabled: bool,
}

impl DispatchRequest {
    /// Build a request.
    ///
    /// # Errors
    /// Validation error when `attempt_count` is zero.
    pub fn new(
        recipient: impl Into<String>,
        attempt_count: u32,
        logging_enabled: bool,
    ) -> Result<Self, ContractError> {
        if attempt_count == 0 {
            return Err(ContractError::validation(
                "attempt_count",
                "at least one attempt is required",
            ));
        }
        Ok(Self {
            recipient: recipient.into(),
            attempt_count,
            logging_enabled,
        })
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn logging_enabled(&self) -> bool {
        self.logging_enabled
    }
}

/// Message content, identical for every attempt of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub body: String,
    #[serde(default)]
    pub subject: Option<String>,
}

impl MessagePayload {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            subject: None,
        }
    }
}

impl Default for MessagePayload {
    fn default() -> Self {
        Self::text(DEFAULT_MESSAGE_BODY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_attempts_rejected() {
        let err = DispatchRequest::new("+447700900001", 0, true).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_request_accessors() {
        let req = DispatchRequest::new("+447700900001", 3, false).unwrap();
        assert_eq!(req.recipient(), "+447700900001");
        assert_eq!(req.attempt_count(), 3);
        assert!(!req.logging_enabled());
    }
}
