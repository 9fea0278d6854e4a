//! Client description: raw caller input and the validated record
//!
//! A [`RawClient`] carries the fields exactly as a caller collected them
//! (numbers still as text). [`derive_values`] validates it once and produces
//! an immutable [`ClientRecord`] that every script generator reads.

pub mod derive;
pub mod id;

pub use derive::{derive_values, CameraPorts, PortPlan};
pub use id::{normalize_identifier, ClientId};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClientError {
    #[error("Invalid client ID {0:?}: use only letters, digits and hyphens")]
    InvalidIdentifier(String),
    #[error("Invalid number for {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("{field} out of range: {value} (expected {min}-{max})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("Invalid LAN prefix {0:?}: expected three octets like 192.168.28")]
    InvalidLanPrefix(String),
    #[error("Missing LAN prefix for {0}: the base script needs one like 192.168.28")]
    MissingLanPrefix(String),
    #[error("Invalid DHCP range: start {start} is after end {end}")]
    InvalidDhcpRange { start: u8, end: u8 },
    #[error("Missing address for camera {index}")]
    IncompleteCameraList { index: usize },
}

/// DVR/NVR brand behind the forwarded camera ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CameraVendor {
    #[default]
    Dahua,
    Hikvision,
}

impl fmt::Display for CameraVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraVendor::Dahua => f.write_str("Dahua"),
            CameraVendor::Hikvision => f.write_str("Hikvision"),
        }
    }
}

/// Caller-supplied camera section, before validation
#[derive(Debug, Clone, Default)]
pub struct RawCameras {
    pub enabled: bool,
    pub vendor: CameraVendor,
    pub count: String,
    pub addresses: Vec<String>,
}

/// Caller-supplied client fields, before validation
#[derive(Debug, Clone, Default)]
pub struct RawClient {
    pub id: String,
    pub tunnel_suffix: String,
    pub lan_prefix: Option<String>,
    pub dhcp_start: String,
    pub dhcp_end: String,
    pub dns_servers: String,
    pub public_key: Option<String>,
    pub cameras: Option<RawCameras>,
}

/// Last-octet bounds of the DHCP pool inside the LAN prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DhcpRange {
    pub start: u8,
    pub end: u8,
}

/// Camera forwarding setup, only present when DNAT was requested
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraSetup {
    pub vendor: CameraVendor,
    pub count: u8,
    pub addresses: Vec<String>,
    pub ports: PortPlan,
}

impl CameraSetup {
    /// `(camera number, address, ports)` for every camera, 1-based, in list order
    pub fn cameras(&self) -> impl Iterator<Item = (u8, &str, CameraPorts)> + '_ {
        (1..=self.count)
            .zip(self.addresses.iter())
            .map(|(n, addr)| (n, addr.as_str(), self.ports.camera(n)))
    }

    /// True when every camera slot has a non-empty address
    pub fn is_complete(&self) -> bool {
        self.addresses.len() == usize::from(self.count)
            && self.addresses.iter().all(|a| !a.is_empty())
    }
}

/// Validated, immutable description of one remote client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientRecord {
    id: ClientId,
    tunnel_suffix: u8,
    tunnel_address: Ipv4Addr,
    lan_prefix: Option<String>,
    dhcp_range: DhcpRange,
    dns_servers: String,
    public_key: Option<String>,
    cameras: Option<CameraSetup>,
}

impl ClientRecord {
    pub fn id(&self) -> &ClientId {
        &self.id
    }

    pub fn tunnel_suffix(&self) -> u8 {
        self.tunnel_suffix
    }

    /// `100.100.100.<suffix>`
    pub fn tunnel_address(&self) -> Ipv4Addr {
        self.tunnel_address
    }

    /// Three-octet LAN prefix such as `192.168.28`
    pub fn lan_prefix(&self) -> Option<&str> {
        self.lan_prefix.as_deref()
    }

    pub fn dhcp_range(&self) -> DhcpRange {
        self.dhcp_range
    }

    pub fn dns_servers(&self) -> &str {
        &self.dns_servers
    }

    pub fn public_key(&self) -> Option<&str> {
        self.public_key.as_deref()
    }

    pub fn cameras(&self) -> Option<&CameraSetup> {
        self.cameras.as_ref()
    }

    pub fn dnat_enabled(&self) -> bool {
        self.cameras.is_some()
    }

    /// Check that every camera slot has an address
    ///
    /// Generators assume this holds; callers run it before asking for the
    /// port-forwarding rules.
    pub fn check_camera_list(&self) -> Result<(), ClientError> {
        let Some(cameras) = &self.cameras else {
            return Ok(());
        };

        for index in 0..usize::from(cameras.count) {
            match cameras.addresses.get(index) {
                Some(addr) if !addr.is_empty() => {}
                _ => return Err(ClientError::IncompleteCameraList { index: index + 1 }),
            }
        }

        Ok(())
    }
}
