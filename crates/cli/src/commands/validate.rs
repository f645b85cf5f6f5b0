//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use config_loader::{resolve_identities, ConfigLoader};
use contracts::{ContractError, DeliverySettings};
use sender_pool::SenderPool;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<SettingsSummary>,
}

#[derive(Serialize)]
struct SettingsSummary {
    channel: String,
    policy: String,
    sender_count: usize,
    transport: String,
    throttle_ms: u64,
    retry_backoff_ms: u64,
    logging_enabled: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating settings");

    let result = validate_settings(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Settings validation failed")
    }
}

fn validate_settings(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match check(args) {
        Ok((settings, sender_count)) => {
            let warnings = collect_warnings(&settings, sender_count);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(SettingsSummary {
                    channel: settings.message.channel.to_string(),
                    policy: format!("{:?}", settings.senders.policy),
                    sender_count,
                    transport: format!("{:?}", settings.transport.kind),
                    throttle_ms: settings.timing.throttle_ms,
                    retry_backoff_ms: settings.timing.retry_backoff_ms,
                    logging_enabled: settings.logging.enabled,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Everything `run` would reject before sending
fn check(args: &ValidateArgs) -> Result<(DeliverySettings, usize), ContractError> {
    let settings = ConfigLoader::load_from_path(&args.config)?;
    let identities = resolve_identities(&settings.senders, None)?;
    let sender_count = identities.len();
    SenderPool::from_config(&settings.senders, settings.message.channel, identities)?;

    if let Some(recipient) = &args.recipient {
        settings.message.channel.check_recipient(recipient.trim())?;
    }
    Ok((settings, sender_count))
}

/// Non-fatal issues
fn collect_warnings(settings: &DeliverySettings, sender_count: usize) -> Vec<String> {
    let mut warnings = Vec::new();

    if settings.senders.policy.needs_pool() && sender_count == 1 {
        warnings.push("Only one sender identity configured - no rotation will happen".to_string());
    }
    if settings.timing.throttle_ms == 0 {
        warnings.push("timing.throttle_ms is 0 - attempts are sent back to back".to_string());
    }
    if !settings.logging.enabled {
        warnings.push("logging.enabled is false - no run log file will be written".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Settings are valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Channel: {}", summary.channel);
            println!("  Policy: {}", summary.policy);
            println!("  Senders: {}", summary.sender_count);
            println!("  Transport: {}", summary.transport);
            println!("  Throttle: {}ms", summary.throttle_ms);
            println!("  Retry backoff: {}ms", summary.retry_backoff_ms);
            println!("  Run log: {}", if summary.logging_enabled { "on" } else { "off" });
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Settings are invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
