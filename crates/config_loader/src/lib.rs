//! # Config Loader
//!
//! Settings loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON settings files
//! - Validate settings
//! - Resolve sender identities from files and delimited lists
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let settings = ConfigLoader::load_from_path(Path::new("delivery.toml")).unwrap();
//! println!("Channel: {}", settings.message.channel);
//! ```

mod parser;
mod sources;
mod validator;

pub use contracts::DeliverySettings;
pub use parser::ConfigFormat;
pub use sources::{load_identity_file, parse_identity_list, parse_identity_lines, resolve_identities};

use contracts::ContractError;
use std::path::Path;

/// Settings loader
///
/// Provides static methods to load settings from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings from a file path
    ///
    /// Detects the format from the file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<DeliverySettings, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load settings from a string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<DeliverySettings, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate settings assembled in code (e.g. after CLI overrides)
    pub fn validate(settings: &DeliverySettings) -> Result<(), ContractError> {
        validator::validate(settings)
    }

    /// Serialize settings to a TOML string
    pub fn to_toml(settings: &DeliverySettings) -> Result<String, ContractError> {
        toml::to_string_pretty(settings)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize settings to a JSON string
    pub fn to_json(settings: &DeliverySettings) -> Result<String, ContractError> {
        serde_json::to_string_pretty(settings)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<DeliverySettings, ContractError> {
        let settings = parser::parse(content, format)?;
        validator::validate(&settings)?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::RotationPolicy;

    const MINIMAL_TOML: &str = r#"
[message]
channel = "sms"
body = "Test message from the rig"

[senders]
policy = "round_robin"
identities = ["+447700900001", "+447700900002"]

[timing]
throttle_ms = 50
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let settings = result.unwrap();
        assert_eq!(settings.senders.policy, RotationPolicy::RoundRobin);
        assert_eq!(settings.timing.throttle_ms, 50);
    }

    #[test]
    fn test_round_trip_toml() {
        let settings = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&settings).unwrap();
        let settings2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(settings.senders.identities, settings2.senders.identities);
        assert_eq!(settings.timing, settings2.timing);
    }

    #[test]
    fn test_round_trip_json() {
        let settings = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&settings).unwrap();
        let settings2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(settings.message.body, settings2.message.body);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[senders]
policy = "synthetic_generate"
identities = ["+447700900001"]
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().is_configuration());
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delivery.toml");
        std::fs::write(&path, MINIMAL_TOML).unwrap();
        assert!(ConfigLoader::load_from_path(&path).is_ok());

        let bad = dir.path().join("delivery.yaml");
        std::fs::write(&bad, "x: 1").unwrap();
        let err = ConfigLoader::load_from_path(&bad).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_nan_failure_rate_rejected_on_load() {
        let toml = "[transport]\nfailure_rate = nan\n";
        let err = ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap_err();
        assert!(err.is_configuration());
    }
}
