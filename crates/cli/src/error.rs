//! Error types for CLI operations.

use dispatcher::DispatchError;
use thiserror::Error;

/// Ways a command can end without a run being started
#[derive(Error, Debug)]
pub enum CliError {
    /// Malformed input (recipient, attempt count)
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Settings or sender pool unusable
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The selected transport could not be built
    #[error("Transport setup failed: {message}")]
    TransportSetup { message: String },

    /// Generic error wrapper
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn transport_setup(message: impl Into<String>) -> Self {
        Self::TransportSetup {
            message: message.into(),
        }
    }
}

impl From<contracts::ContractError> for CliError {
    fn from(err: contracts::ContractError) -> Self {
        if err.is_validation() {
            Self::invalid_input(err.to_string())
        } else {
            Self::configuration(err.to_string())
        }
    }
}

impl From<DispatchError> for CliError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Rejected(e) => e.into(),
            other => Self::Other(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ContractError;

    #[test]
    fn test_contract_error_classification() {
        let err: CliError = ContractError::validation("recipient", "bad").into();
        assert!(matches!(err, CliError::InvalidInput { .. }));

        let err: CliError = DispatchError::from(ContractError::configuration("empty pool")).into();
        assert!(matches!(err, CliError::Configuration { .. }));
    }
}
