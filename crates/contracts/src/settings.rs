//! DeliverySettings - Config Loader output
//!
//! Describes how runs are performed: channel and message, sender rotation,
//! pacing, run logging and which transport to use.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

use crate::{ChannelKind, MessagePayload, SenderIdentity, DEFAULT_MESSAGE_BODY};

/// Full settings document
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DeliverySettings {
    #[serde(default)]
    #[validate(nested)]
    pub message: MessageConfig,

    #[serde(default)]
    pub senders: SenderConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    #[validate(nested)]
    pub transport: TransportConfig,
}

/// Channel and content
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MessageConfig {
    #[serde(default)]
    pub channel: ChannelKind,

    #[serde(default = "default_body")]
    #[validate(length(min = 1, message = "message body cannot be empty"))]
    pub body: String,

    #[serde(default)]
    pub subject: Option<String>,
}

fn default_body() -> String {
    DEFAULT_MESSAGE_BODY.to_string()
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            channel: ChannelKind::default(),
            body: default_body(),
            subject: None,
        }
    }
}

impl MessageConfig {
    pub fn payload(&self) -> MessagePayload {
        MessagePayload {
            body: self.body.clone(),
            subject: self.subject.clone(),
        }
    }
}

/// Strategy for choosing the sender of each attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPolicy {
    /// `pool[i mod len]`
    RoundRobin,
    /// Uniform draw from the pool per attempt
    #[default]
    RandomChoice,
    /// Fabricate an identity per attempt; no pool
    SyntheticGenerate,
}

impl RotationPolicy {
    /// Whether the policy draws from configured identities
    pub fn needs_pool(&self) -> bool {
        !matches!(self, Self::SyntheticGenerate)
    }
}

/// Sender identities and how to rotate through them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SenderConfig {
    #[serde(default)]
    pub policy: RotationPolicy,

    /// Inline identities
    #[serde(default)]
    pub identities: Vec<SenderIdentity>,

    /// Newline-delimited identity file, merged after the inline list
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Seed for the random source (random choice / synthetic)
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Pacing between sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_throttle_ms() -> u64 {
    100
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            throttle_ms: default_throttle_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl TimingConfig {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Run log file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("logs")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: default_log_directory(),
        }
    }
}

/// Transport type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Local simulation, no network
    #[default]
    Simulated,
    /// Twilio Programmable Messaging
    Twilio,
}

/// Transport settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransportConfig {
    #[serde(default)]
    pub kind: TransportKind,

    /// Probability that a simulated send fails
    #[serde(default = "default_failure_rate")]
    #[validate(range(min = 0.0, max = 1.0, message = "failure_rate must be within [0, 1]"))]
    pub failure_rate: f64,

    /// Simulated per-send latency
    #[serde(default)]
    pub latency_ms: u64,

    #[serde(default)]
    pub seed: Option<u64>,

    /// Override for the Twilio API base URL
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_failure_rate() -> f64 {
    0.05
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::default(),
            failure_rate: default_failure_rate(),
            latency_ms: 0,
            seed: None,
            base_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_observed_behaviour() {
        let settings = DeliverySettings::default();
        assert_eq!(settings.timing.throttle(), Duration::from_millis(100));
        assert_eq!(settings.timing.retry_backoff(), Duration::from_secs(1));
        assert_eq!(settings.senders.policy, RotationPolicy::RandomChoice);
        assert!(settings.logging.enabled);
        assert_eq!(settings.message.channel, ChannelKind::Sms);
    }

    #[test]
    fn test_validate_failure_rate_range() {
        let mut settings = DeliverySettings::default();
        assert!(settings.validate().is_ok());

        settings.transport.failure_rate = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_empty_body() {
        let mut settings = DeliverySettings::default();
        settings.message.body.clear();
        assert!(settings.validate().is_err());
    }
}
