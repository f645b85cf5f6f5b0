//! Sender identity sources
//!
//! Identities come from the inline settings list, a newline-delimited file,
//! or a comma-delimited value (typically an environment entry read by the
//! binary). Blank entries are skipped; `#` starts a comment line in files.

use std::path::Path;

use contracts::{ContractError, SenderConfig, SenderIdentity};
use tracing::debug;

/// Parse a comma-delimited identity list
pub fn parse_identity_list(value: &str) -> Vec<SenderIdentity> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(SenderIdentity::from)
        .collect()
}

/// Parse newline-delimited identities
pub fn parse_identity_lines(content: &str) -> Vec<SenderIdentity> {
    content
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.starts_with('#'))
        .map(SenderIdentity::from)
        .collect()
}

/// Load newline-delimited identities from `path`
pub fn load_identity_file(path: &Path) -> Result<Vec<SenderIdentity>, ContractError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ContractError::configuration(format!(
            "cannot read sender identity file '{}': {e}",
            path.display()
        ))
    })?;
    let identities = parse_identity_lines(&content);
    debug!(path = %path.display(), count = identities.len(), "Sender identity file loaded");
    Ok(identities)
}

/// Collect identities in order: inline list, file, then `extra_list`.
///
/// Duplicates are kept once, first occurrence wins. An empty result is not
/// an error here; the pool decides whether its policy needs identities.
pub fn resolve_identities(
    config: &SenderConfig,
    extra_list: Option<&str>,
) -> Result<Vec<SenderIdentity>, ContractError> {
    let mut identities: Vec<SenderIdentity> = config
        .identities
        .iter()
        .map(|id| SenderIdentity::from(id.trim()))
        .filter(|id| !id.is_empty())
        .collect();

    if let Some(path) = &config.file {
        identities.extend(load_identity_file(path)?);
    }
    if let Some(list) = extra_list {
        identities.extend(parse_identity_list(list));
    }

    let mut seen = std::collections::HashSet::new();
    identities.retain(|id| seen.insert(id.clone()));
    Ok(identities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_identity_list() {
        let ids = parse_identity_list(" +447700900001, ,+447700900002,");
        assert_eq!(ids, vec![SenderIdentity::from("+447700900001"), SenderIdentity::from("+447700900002")]);
        assert!(parse_identity_list("").is_empty());
    }

    #[test]
    fn test_parse_identity_lines_skips_comments() {
        let ids = parse_identity_lines("# pool A\n+447700900001\n\n  +447700900002  \r\n");
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[1], "+447700900002");
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = load_identity_file(Path::new("/nonexistent/senders.txt")).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_resolve_merges_and_dedupes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("senders.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "+447700900002\n+447700900003").unwrap();

        let config = SenderConfig {
            identities: vec!["+447700900001".into(), "+447700900002".into()],
            file: Some(path),
            ..Default::default()
        };

        let ids = resolve_identities(&config, Some("+447700900003,+447700900004")).unwrap();
        let as_str: Vec<_> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(
            as_str,
            vec!["+447700900001", "+447700900002", "+447700900003", "+447700900004"]
        );
    }

    #[test]
    fn test_resolve_empty_is_ok() {
        let ids = resolve_identities(&SenderConfig::default(), None).unwrap();
        assert!(ids.is_empty());
    }
}
