//! Client description file (TOML)
//!
//! ```toml
//! [client]
//! id = "MC30"
//! tunnel_suffix = 30
//! lan_prefix = "192.168.28"
//! dhcp_start = 10
//! dhcp_end = 100
//! dns_servers = "8.8.8.8,8.8.4.4"
//! public_key = "..."
//!
//! [cameras]
//! enabled = true
//! vendor = "Hikvision"
//! count = 2
//! addresses = ["192.168.28.201", "192.168.28.202"]
//! ```
//!
//! Numbers may also be written as strings; they are validated later by
//! [`derive_values`](crate::client::derive_values), not here.

use crate::client::{CameraVendor, RawCameras, RawClient};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const LOCAL_CONFIG_FILE: &str = "mikrotik-client.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("No client config found (tried {0}); run `mikrotik-wg-gen init` to create one")]
    NotFound(String),
}

/// A number as typed by the user: TOML integer or free text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    Number(i64),
    Text(String),
}

impl fmt::Display for NumberInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberInput::Number(n) => write!(f, "{}", n),
            NumberInput::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for NumberInput {
    fn from(n: i64) -> Self {
        NumberInput::Number(n)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub client: ClientSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cameras: Option<CameraSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSection {
    pub id: String,
    pub tunnel_suffix: NumberInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lan_prefix: Option<String>,
    #[serde(default = "default_dhcp_start")]
    pub dhcp_start: NumberInput,
    #[serde(default = "default_dhcp_end")]
    pub dhcp_end: NumberInput,
    #[serde(default = "default_dns_servers")]
    pub dns_servers: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub vendor: CameraVendor,
    #[serde(default = "default_camera_count")]
    pub count: NumberInput,
    #[serde(default)]
    pub addresses: Vec<String>,
}

fn default_dhcp_start() -> NumberInput {
    NumberInput::Number(10)
}

fn default_dhcp_end() -> NumberInput {
    NumberInput::Number(100)
}

fn default_dns_servers() -> String {
    "8.8.8.8,8.8.4.4".to_string()
}

fn default_camera_count() -> NumberInput {
    NumberInput::Number(1)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client: ClientSection {
                id: "MC30".to_string(),
                tunnel_suffix: NumberInput::Number(30),
                lan_prefix: Some("192.168.28".to_string()),
                dhcp_start: default_dhcp_start(),
                dhcp_end: default_dhcp_end(),
                dns_servers: default_dns_servers(),
                public_key: None,
            },
            cameras: Some(CameraSection {
                enabled: false,
                vendor: CameraVendor::Dahua,
                count: default_camera_count(),
                addresses: vec![],
            }),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from `explicit`, else `./mikrotik-client.toml`, else
    /// `~/.config/mikrotik-wg-gen/client.toml`
    pub fn find(explicit: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, path.to_path_buf()));
        }

        let candidates: Vec<PathBuf> = std::iter::once(PathBuf::from(LOCAL_CONFIG_FILE))
            .chain(default_config_path())
            .collect();

        for path in &candidates {
            debug!("Looking for client config at {}", path.display());
            if path.exists() {
                info!("Using client config {}", path.display());
                return Ok((Self::load(path)?, path.clone()));
            }
        }

        let tried = candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(ConfigError::NotFound(tried))
    }

    /// Raw caller fields, ready for validation
    pub fn to_raw(&self) -> RawClient {
        let c = &self.client;
        RawClient {
            id: c.id.clone(),
            tunnel_suffix: c.tunnel_suffix.to_string(),
            lan_prefix: c.lan_prefix.clone(),
            dhcp_start: c.dhcp_start.to_string(),
            dhcp_end: c.dhcp_end.to_string(),
            dns_servers: c.dns_servers.clone(),
            public_key: c.public_key.clone(),
            cameras: self.cameras.as_ref().map(|cams| RawCameras {
                enabled: cams.enabled,
                vendor: cams.vendor,
                count: cams.count.to_string(),
                addresses: cams.addresses.clone(),
            }),
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| {
        home.join(".config")
            .join("mikrotik-wg-gen")
            .join("client.toml")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{derive_values, ClientError};
    use tempfile::TempDir;

    #[test]
    fn test_default_round_trips_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("client.toml");

        Config::default().save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();

        assert_eq!(loaded.client.id, "MC30");
        assert_eq!(loaded.client.tunnel_suffix, NumberInput::Number(30));
        assert_eq!(loaded.client.lan_prefix.as_deref(), Some("192.168.28"));
        assert!(!loaded.cameras.unwrap().enabled);
    }

    #[test]
    fn test_parse_minimal_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [client]
            id = "sede-01"
            tunnel_suffix = 42
            "#,
        )
        .unwrap();

        let raw = config.to_raw();
        assert_eq!(raw.tunnel_suffix, "42");
        assert_eq!(raw.dhcp_start, "10");
        assert_eq!(raw.dhcp_end, "100");
        assert_eq!(raw.dns_servers, "8.8.8.8,8.8.4.4");
        assert!(raw.lan_prefix.is_none());
        assert!(raw.cameras.is_none());
    }

    #[test]
    fn test_parse_cameras() {
        let config: Config = toml::from_str(
            r#"
            [client]
            id = "mc30"
            tunnel_suffix = "30"

            [cameras]
            enabled = true
            vendor = "Hikvision"
            count = 2
            addresses = ["192.168.1.50", "192.168.1.51"]
            "#,
        )
        .unwrap();

        let record = derive_values(&config.to_raw()).unwrap();
        let cameras = record.cameras().unwrap();
        assert_eq!(cameras.vendor, CameraVendor::Hikvision);
        assert_eq!(cameras.count, 2);
        assert_eq!(cameras.ports.base(), 8300);
    }

    #[test]
    fn test_text_number_is_not_coerced() {
        let config: Config = toml::from_str(
            r#"
            [client]
            id = "mc30"
            tunnel_suffix = "treinta"
            "#,
        )
        .unwrap();

        assert!(matches!(
            derive_values(&config.to_raw()),
            Err(ClientError::InvalidNumber { field: "tunnel_suffix", .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/mikrotik-client.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[client\nid=").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_find_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("other.toml");
        Config::default().save(&path).unwrap();

        let (config, used) = Config::find(Some(&path)).unwrap();
        assert_eq!(used, path);
        assert_eq!(config.client.id, "MC30");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::NotFound("a.toml, b.toml".to_string());
        assert!(err.to_string().contains("a.toml, b.toml"));
        assert!(err.to_string().contains("init"));
    }
}
