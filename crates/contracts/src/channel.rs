//! Delivery channels and their recipient format checks

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ContractError;

/// Kind of message a run delivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Mobile text message
    #[default]
    Sms,
    /// Electronic mail
    Email,
}

impl ChannelKind {
    /// Prefix used for run log file names
    pub fn log_prefix(&self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Email => "email",
        }
    }

    /// Check a recipient string against the channel's address format.
    ///
    /// SMS recipients must be UK numbers in international form (`+44...`,
    /// digits only, at least 12 characters).
    pub fn check_recipient(&self, recipient: &str) -> Result<(), ContractError> {
        let ok = match self {
            Self::Sms => is_uk_phone(recipient),
            Self::Email => is_email(recipient),
        };
        if ok {
            Ok(())
        } else {
            Err(ContractError::validation(
                "recipient",
                format!("'{recipient}' is not a valid {self} recipient"),
            ))
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sms => f.write_str("sms"),
            Self::Email => f.write_str("email"),
        }
    }
}

fn is_uk_phone(phone: &str) -> bool {
    phone.starts_with("+44") && phone.len() >= 12 && phone[1..].bytes().all(|b| b.is_ascii_digit())
}

fn is_email(address: &str) -> bool {
    if address.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.find('.') {
        Some(_) => !domain.starts_with('.') && !domain.ends_with('.'),
        None => false,
    }
}
