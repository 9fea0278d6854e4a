//! Client identifier normalization
//!
//! The identifier ends up verbatim inside interface names, comments and log
//! tags of every generated script, so it is restricted to `[A-Z0-9-]`.

use super::ClientError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A normalized client identifier (uppercase letters, digits, hyphens)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ClientId {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize_identifier(s)
    }
}

/// Uppercase and trim a raw identifier, rejecting anything outside `[A-Z0-9-]+`
pub fn normalize_identifier(raw: &str) -> Result<ClientId, ClientError> {
    let clean = raw.trim().to_uppercase();

    if clean.is_empty() {
        return Err(ClientError::InvalidIdentifier(raw.to_string()));
    }

    let allowed = |c: char| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-';
    if !clean.chars().all(allowed) {
        return Err(ClientError::InvalidIdentifier(raw.to_string()));
    }

    Ok(ClientId(clean))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_uppercases_and_trims() {
        let id = normalize_identifier("  mc30 ").unwrap();
        assert_eq!(id.as_str(), "MC30");
    }

    #[test]
    fn test_normalize_keeps_hyphens() {
        let id = normalize_identifier("empresa-01").unwrap();
        assert_eq!(id.to_string(), "EMPRESA-01");
    }

    #[test]
    fn test_normalize_rejects_space() {
        let result = normalize_identifier("client one");
        assert!(matches!(result, Err(ClientError::InvalidIdentifier(_))));
    }

    #[test]
    fn test_normalize_rejects_empty() {
        assert!(normalize_identifier("").is_err());
        assert!(normalize_identifier("   ").is_err());
    }

    #[test]
    fn test_normalize_rejects_punctuation_and_unicode() {
        assert!(normalize_identifier("mc_30").is_err());
        assert!(normalize_identifier("mc.30").is_err());
        assert!(normalize_identifier("cámara").is_err());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["mc30", "A-b-C", "  x1 ", "---", "0"] {
            let once = normalize_identifier(raw).unwrap();
            let twice = normalize_identifier(once.as_str()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_from_str() {
        let id: ClientId = "sede-norte".parse().unwrap();
        assert_eq!(id.as_str(), "SEDE-NORTE");
        assert!("".parse::<ClientId>().is_err());
    }
}
