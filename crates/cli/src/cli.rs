//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::{ChannelKind, RotationPolicy};
use std::path::PathBuf;

/// Delivery Tester - bulk SMS/email delivery testing
#[derive(Parser, Debug)]
#[command(
    name = "delivery-tester",
    author,
    version,
    about = "Bulk SMS/email delivery testing",
    long_about = "Sends a configurable number of test messages to one recipient,\n\
                  rotating sender identities, retrying each failure once and\n\
                  writing a timestamped per-run log."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "DELIVERY_TESTER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "DELIVERY_TESTER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a batch of test messages
    Run(RunArgs),

    /// Validate a settings file (and optionally a recipient) without sending
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to settings file (TOML or JSON); built-in defaults when absent
    #[arg(short, long, env = "DELIVERY_TESTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Recipient phone number (+44...) or email address
    #[arg(short, long)]
    pub recipient: String,

    /// Number of attempts
    #[arg(
        short = 'n',
        long,
        default_value = "1",
        value_parser = clap::value_parser!(u32).range(1..=1000)
    )]
    pub count: u32,

    /// Override the channel from settings
    #[arg(long, value_enum)]
    pub channel: Option<ChannelArg>,

    /// Override the sender rotation policy from settings
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Seed for sender selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Newline-delimited sender identity file
    #[arg(long)]
    pub senders_file: Option<PathBuf>,

    /// Comma-delimited sender identities
    #[arg(long, env = "TWILIO_SENDER_NUMBERS")]
    pub sender_list: Option<String>,

    /// Force the simulated transport regardless of settings
    #[arg(long)]
    pub simulate: bool,

    /// Pause between attempts in milliseconds
    #[arg(long)]
    pub throttle_ms: Option<u64>,

    /// Pause before a retry in milliseconds
    #[arg(long)]
    pub retry_backoff_ms: Option<u64>,

    /// Directory for the per-run log file
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Do not write a per-run log file
    #[arg(long)]
    pub no_log: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "DELIVERY_TESTER_METRICS_PORT")]
    pub metrics_port: u16,

    /// Print progress events as JSON lines
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub twilio: TwilioArgs,
}

/// Twilio account credentials
#[derive(Args, Debug, Clone, Default)]
pub struct TwilioArgs {
    /// Twilio account SID
    #[arg(long, env = "TWILIO_ACCOUNT_SID", hide_env_values = true)]
    pub account_sid: Option<String>,

    /// Twilio auth token
    #[arg(long, env = "TWILIO_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to settings file to validate
    #[arg(short, long, default_value = "delivery.toml")]
    pub config: PathBuf,

    /// Recipient to check against the configured channel
    #[arg(short, long)]
    pub recipient: Option<String>,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Channel selection
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ChannelArg {
    Sms,
    Email,
}

impl From<ChannelArg> for ChannelKind {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::Sms => ChannelKind::Sms,
            ChannelArg::Email => ChannelKind::Email,
        }
    }
}

/// Sender rotation policy
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum PolicyArg {
    RoundRobin,
    Random,
    Synthetic,
}

impl From<PolicyArg> for RotationPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::RoundRobin => RotationPolicy::RoundRobin,
            PolicyArg::Random => RotationPolicy::RandomChoice,
            PolicyArg::Synthetic => RotationPolicy::SyntheticGenerate,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
