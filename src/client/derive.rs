//! Derived addressing and port values
//!
//! Everything here hangs off the tunnel suffix (last octet inside
//! `100.100.100.0/24`):
//!
//! | Value | Formula |
//! |-------|---------|
//! | tunnel address | `100.100.100.<suffix>` |
//! | port base | `8000 + suffix * 10` |
//! | camera `n` HTTP | `base + n` |
//! | camera `n` RTSP | `base + n + 50` |
//!
//! Each client owns a block of 10 ports, so with more than 9 cameras the
//! HTTP ports run into the next suffix's block (camera 10 of suffix `s` is
//! the port base of suffix `s + 1`). RTSP ports sit 50 above, which is
//! the HTTP block of suffix `s + 5`. Deployments keep suffixes apart
//! accordingly; the formula itself is fixed because devices already in the
//! field were provisioned with it.

use super::{CameraSetup, ClientError, ClientRecord, DhcpRange, RawClient, normalize_identifier};
use serde::Serialize;
use std::net::Ipv4Addr;
use tracing::{debug, warn};

pub const TUNNEL_NETWORK: [u8; 3] = [100, 100, 100];
pub const TUNNEL_SUFFIX_MIN: u8 = 2;
pub const TUNNEL_SUFFIX_MAX: u8 = 254;
pub const CAMERA_COUNT_MIN: u8 = 1;
pub const CAMERA_COUNT_MAX: u8 = 20;

pub const PORT_BASE_START: u16 = 8000;
pub const PORT_BLOCK_SIZE: u16 = 10;
pub const RTSP_OFFSET: u16 = 50;

/// Forwarded ports for a single camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CameraPorts {
    pub http: u16,
    pub rtsp: u16,
}

/// Per-client NAT port block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortPlan {
    base: u16,
}

impl PortPlan {
    pub fn for_suffix(suffix: u8) -> Self {
        Self {
            base: PORT_BASE_START + u16::from(suffix) * PORT_BLOCK_SIZE,
        }
    }

    pub fn base(&self) -> u16 {
        self.base
    }

    /// Ports for camera `n` (1-based)
    pub fn camera(&self, n: u8) -> CameraPorts {
        let http = self.base + u16::from(n);
        CameraPorts {
            http,
            rtsp: http + RTSP_OFFSET,
        }
    }

    /// Whether `camera_count` cameras spill into the next suffix's port block
    pub fn overlaps_next_client(camera_count: u8) -> bool {
        u16::from(camera_count) >= PORT_BLOCK_SIZE
    }
}

/// `100.100.100.<suffix>`
pub fn tunnel_address(suffix: u8) -> Ipv4Addr {
    let [a, b, c] = TUNNEL_NETWORK;
    Ipv4Addr::new(a, b, c, suffix)
}

/// Validate raw caller input and compute the derived fields
///
/// Numeric fields are parsed strictly: empty or non-numeric text is an
/// [`ClientError::InvalidNumber`], never a silent zero.
pub fn derive_values(raw: &RawClient) -> Result<ClientRecord, ClientError> {
    let id = normalize_identifier(&raw.id)?;

    let tunnel_suffix = parse_u8(
        "tunnel_suffix",
        &raw.tunnel_suffix,
        TUNNEL_SUFFIX_MIN,
        TUNNEL_SUFFIX_MAX,
    )?;
    let tunnel_address = tunnel_address(tunnel_suffix);

    let lan_prefix = match raw.lan_prefix.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(prefix) => Some(parse_lan_prefix(prefix)?),
    };

    let start = parse_u8("dhcp_start", &raw.dhcp_start, 1, 254)?;
    let end = parse_u8("dhcp_end", &raw.dhcp_end, 1, 254)?;
    if start > end {
        return Err(ClientError::InvalidDhcpRange { start, end });
    }

    let public_key = raw
        .public_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string);

    let cameras = match &raw.cameras {
        Some(cams) if cams.enabled => {
            let count = parse_u8("camera_count", &cams.count, CAMERA_COUNT_MIN, CAMERA_COUNT_MAX)?;
            let ports = PortPlan::for_suffix(tunnel_suffix);

            if PortPlan::overlaps_next_client(count) {
                warn!(
                    "{} cameras on suffix {} overlap the port block of suffix {}",
                    count,
                    tunnel_suffix,
                    u16::from(tunnel_suffix) + 1
                );
            }

            Some(CameraSetup {
                vendor: cams.vendor,
                count,
                addresses: cams
                    .addresses
                    .iter()
                    .take(usize::from(count))
                    .map(|a| a.trim().to_string())
                    .collect(),
                ports,
            })
        }
        _ => None,
    };

    debug!(
        "Derived {}: tunnel={}, lan={:?}, port_base={:?}",
        id,
        tunnel_address,
        lan_prefix,
        cameras.as_ref().map(|c| c.ports.base())
    );

    Ok(ClientRecord {
        id,
        tunnel_suffix,
        tunnel_address,
        lan_prefix,
        dhcp_range: DhcpRange { start, end },
        dns_servers: raw.dns_servers.trim().to_string(),
        public_key,
        cameras,
    })
}

fn parse_u8(field: &'static str, raw: &str, min: u8, max: u8) -> Result<u8, ClientError> {
    let text = raw.trim();
    let value: i64 = text.parse().map_err(|_| ClientError::InvalidNumber {
        field,
        value: raw.to_string(),
    })?;

    let out_of_range = ClientError::OutOfRange {
        field,
        value,
        min: i64::from(min),
        max: i64::from(max),
    };

    match u8::try_from(value) {
        Ok(v) if (min..=max).contains(&v) => Ok(v),
        _ => Err(out_of_range),
    }
}

fn parse_lan_prefix(prefix: &str) -> Result<String, ClientError> {
    let octets: Vec<&str> = prefix.split('.').collect();
    let valid = octets.len() == 3
        && octets.iter().all(|o| {
            !o.is_empty() && o.chars().all(|c| c.is_ascii_digit()) && o.parse::<u8>().is_ok()
        });

    if valid {
        Ok(prefix.to_string())
    } else {
        Err(ClientError::InvalidLanPrefix(prefix.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{CameraVendor, RawCameras};

    fn raw(suffix: &str) -> RawClient {
        RawClient {
            id: "mc30".to_string(),
            tunnel_suffix: suffix.to_string(),
            lan_prefix: None,
            dhcp_start: "10".to_string(),
            dhcp_end: "100".to_string(),
            dns_servers: "8.8.8.8,8.8.4.4".to_string(),
            public_key: None,
            cameras: None,
        }
    }

    fn with_cameras(mut raw: RawClient, count: &str, addresses: &[&str]) -> RawClient {
        raw.cameras = Some(RawCameras {
            enabled: true,
            vendor: CameraVendor::Dahua,
            count: count.to_string(),
            addresses: addresses.iter().map(|s| s.to_string()).collect(),
        });
        raw
    }

    #[test]
    fn test_mc30_scenario() {
        let record = derive_values(&with_cameras(raw("30"), "1", &["192.168.1.50"])).unwrap();

        assert_eq!(record.id().as_str(), "MC30");
        assert_eq!(record.tunnel_address().to_string(), "100.100.100.30");

        let cameras = record.cameras().unwrap();
        assert_eq!(cameras.ports.base(), 8300);
        assert_eq!(cameras.ports.camera(1), CameraPorts { http: 8301, rtsp: 8351 });
    }

    #[test]
    fn test_tunnel_address_for_all_suffixes() {
        for suffix in TUNNEL_SUFFIX_MIN..=TUNNEL_SUFFIX_MAX {
            let record = derive_values(&raw(&suffix.to_string())).unwrap();
            assert_eq!(
                record.tunnel_address().to_string(),
                format!("100.100.100.{}", suffix)
            );
        }
    }

    #[test]
    fn test_port_formula() {
        for suffix in [2u8, 30, 99, 254] {
            let plan = PortPlan::for_suffix(suffix);
            assert_eq!(plan.base(), 8000 + u16::from(suffix) * 10);
            for n in 1..=20u8 {
                let ports = plan.camera(n);
                assert_eq!(ports.http, plan.base() + u16::from(n));
                assert_eq!(ports.rtsp, plan.base() + u16::from(n) + 50);
            }
        }
    }

    #[test]
    fn test_collision_boundary() {
        assert!(!PortPlan::overlaps_next_client(9));
        assert!(PortPlan::overlaps_next_client(10));

        // camera 10 of suffix 30 lands on the base of suffix 31
        let here = PortPlan::for_suffix(30);
        let next = PortPlan::for_suffix(31);
        assert_eq!(here.camera(10).http, next.base());
    }

    #[test]
    fn test_port_base_absent_without_dnat() {
        let record = derive_values(&raw("30")).unwrap();
        assert!(record.cameras().is_none());

        let mut disabled = with_cameras(raw("30"), "1", &["192.168.1.50"]);
        if let Some(cams) = disabled.cameras.as_mut() {
            cams.enabled = false;
        }
        let record = derive_values(&disabled).unwrap();
        assert!(!record.dnat_enabled());
    }

    #[test]
    fn test_invalid_suffix_number() {
        for bad in ["", "abc", "3.5", "  "] {
            let result = derive_values(&raw(bad));
            assert!(
                matches!(result, Err(ClientError::InvalidNumber { field: "tunnel_suffix", .. })),
                "expected InvalidNumber for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_suffix_out_of_range() {
        for bad in ["0", "1", "255", "-4", "1000"] {
            let result = derive_values(&raw(bad));
            assert!(matches!(result, Err(ClientError::OutOfRange { .. })));
        }
    }

    #[test]
    fn test_invalid_camera_count() {
        let result = derive_values(&with_cameras(raw("30"), "", &[]));
        assert!(matches!(
            result,
            Err(ClientError::InvalidNumber { field: "camera_count", .. })
        ));

        let result = derive_values(&with_cameras(raw("30"), "0", &[]));
        assert!(matches!(result, Err(ClientError::OutOfRange { .. })));

        let result = derive_values(&with_cameras(raw("30"), "21", &[]));
        assert!(matches!(result, Err(ClientError::OutOfRange { .. })));
    }

    #[test]
    fn test_camera_count_ignored_when_dnat_disabled() {
        let mut input = with_cameras(raw("30"), "not a number", &[]);
        if let Some(cams) = input.cameras.as_mut() {
            cams.enabled = false;
        }
        assert!(derive_values(&input).is_ok());
    }

    #[test]
    fn test_extra_addresses_truncated() {
        let record =
            derive_values(&with_cameras(raw("30"), "1", &["10.0.0.2", "10.0.0.3"])).unwrap();
        assert_eq!(record.cameras().unwrap().addresses, vec!["10.0.0.2"]);
    }

    #[test]
    fn test_invalid_identifier_fails_first() {
        let mut input = raw("abc");
        input.id = "client one".to_string();
        assert!(matches!(
            derive_values(&input),
            Err(ClientError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_dhcp_range_validation() {
        let mut input = raw("30");
        input.dhcp_start = "200".to_string();
        input.dhcp_end = "100".to_string();
        assert_eq!(
            derive_values(&input),
            Err(ClientError::InvalidDhcpRange { start: 200, end: 100 })
        );

        input.dhcp_start = "ten".to_string();
        assert!(matches!(
            derive_values(&input),
            Err(ClientError::InvalidNumber { field: "dhcp_start", .. })
        ));
    }

    #[test]
    fn test_lan_prefix_parsing() {
        let mut input = raw("30");
        input.lan_prefix = Some(" 192.168.28 ".to_string());
        assert_eq!(derive_values(&input).unwrap().lan_prefix(), Some("192.168.28"));

        input.lan_prefix = Some(String::new());
        assert_eq!(derive_values(&input).unwrap().lan_prefix(), None);

        for bad in ["192.168.28.0", "192.168", "192.168.300", "a.b.c", "192..28"] {
            input.lan_prefix = Some(bad.to_string());
            assert!(matches!(
                derive_values(&input),
                Err(ClientError::InvalidLanPrefix(_))
            ));
        }
    }

    #[test]
    fn test_public_key_blank_is_none() {
        let mut input = raw("30");
        input.public_key = Some("   ".to_string());
        assert_eq!(derive_values(&input).unwrap().public_key(), None);

        input.public_key = Some("abc=".to_string());
        assert_eq!(derive_values(&input).unwrap().public_key(), Some("abc="));
    }
}
