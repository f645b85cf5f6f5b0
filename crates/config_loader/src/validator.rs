//! Settings validation
//!
//! Rules:
//! - field-level constraints declared on the settings types (`validator` derive)
//! - SyntheticGenerate lists no identities and no identity file
//! - inline identities are non-blank
//! - the Twilio transport only serves the SMS channel

use contracts::{ChannelKind, ContractError, DeliverySettings, RotationPolicy, TransportKind};
use validator::Validate;

/// Validate DeliverySettings
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(settings: &DeliverySettings) -> Result<(), ContractError> {
    validate_fields(settings)?;
    validate_sender_policy(settings)?;
    validate_identities(settings)?;
    validate_transport(settings)?;
    Ok(())
}

fn validate_fields(settings: &DeliverySettings) -> Result<(), ContractError> {
    settings
        .validate()
        .map_err(|e| ContractError::configuration(e.to_string()))
}

fn validate_sender_policy(settings: &DeliverySettings) -> Result<(), ContractError> {
    let senders = &settings.senders;
    if senders.policy == RotationPolicy::SyntheticGenerate
        && (!senders.identities.is_empty() || senders.file.is_some())
    {
        return Err(ContractError::configuration(
            "senders.policy: synthetic_generate cannot be combined with senders.identities or senders.file",
        ));
    }
    Ok(())
}

fn validate_identities(settings: &DeliverySettings) -> Result<(), ContractError> {
    for (idx, identity) in settings.senders.identities.iter().enumerate() {
        if identity.trim().is_empty() {
            return Err(ContractError::configuration(format!(
                "senders.identities[{idx}]: sender identity cannot be blank"
            )));
        }
    }
    Ok(())
}

fn validate_transport(settings: &DeliverySettings) -> Result<(), ContractError> {
    // `range` lets NaN through
    if !settings.transport.failure_rate.is_finite() {
        return Err(ContractError::configuration(
            "transport.failure_rate must be a finite number within [0, 1]",
        ));
    }
    if settings.transport.kind == TransportKind::Twilio
        && settings.message.channel != ChannelKind::Sms
    {
        return Err(ContractError::configuration(format!(
            "transport.kind: twilio cannot deliver the {} channel",
            settings.message.channel
        )));
    }
    Ok(())
}
