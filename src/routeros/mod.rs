//! RouterOS script generation
//!
//! Each artifact is a pure function from a [`ClientRecord`](crate::client::ClientRecord)
//! to script text in the RouterOS v7 console dialect. Generators never read
//! each other's output; they only share the constants below.
//!
//! | Artifact | Runs on | Generator |
//! |----------|---------|-----------|
//! | LAN/DHCP/DNS bootstrap | client | [`base::generate_base_artifact`] |
//! | WireGuard interface + peer | client | [`tunnel::generate_tunnel_artifact`] |
//! | Camera DNAT rules | client | [`dnat::generate_port_forwarding_artifact`] |
//! | Safe-pulse watchdog | client | [`watchdog::generate_watchdog_artifact`] |
//! | Peer registration | hub | [`server::generate_server_provisioning_artifact`] |
//! | Camera access URLs | operator | [`urls::generate_camera_urls`] |

pub mod base;
pub mod dnat;
pub mod server;
pub mod tunnel;
pub mod urls;
pub mod watchdog;

pub use base::generate_base_artifact;
pub use dnat::generate_port_forwarding_artifact;
pub use server::generate_server_provisioning_artifact;
pub use tunnel::generate_tunnel_artifact;
pub use urls::generate_camera_urls;
pub use watchdog::{generate_watchdog_artifact, RecoveryStep, WatchdogState};

use crate::client::ClientId;
use std::net::Ipv4Addr;

/// Hub end of the tunnel
pub const HUB_TUNNEL_ADDRESS: Ipv4Addr = Ipv4Addr::new(100, 100, 100, 1);
pub const HUB_ENDPOINT: &str = "mikrotik-sts.cr-safe.com";
pub const HUB_PUBLIC_KEY: &str = "F3o4DvZO1WJCoxS9jQOAD1K2+9CXIw6WAyL1LTNsCQg=";
/// Interface name of the WireGuard server on the hub
pub const HUB_INTERFACE: &str = "wireguard-server";

/// WireGuard port, used both as client listen port and hub endpoint port
pub const WIREGUARD_PORT: u16 = 13231;
pub const PERSISTENT_KEEPALIVE: &str = "25s";

/// Source range of centralized monitoring traffic
pub const MONITORING_SUBNET: &str = "172.16.100.0/24";

pub const LAN_BRIDGE: &str = "LAN-Bridge";
pub const WAN_INTERFACE: &str = "ether1";
pub const LAN_PORTS: [&str; 4] = ["ether2", "ether3", "ether4", "ether5"];

const BANNER_RULE: &str =
    "# ================================================================";

/// `WIREGUARD-<ID>`
pub fn tunnel_interface(id: &ClientId) -> String {
    format!("WIREGUARD-{}", id)
}

/// Line-oriented script builder
///
/// Every line ends with `\n`; the finished text is one self-contained script.
#[derive(Debug, Default)]
pub struct Script {
    text: String,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Boxed header: rule, one `# ` line per entry, rule
    pub fn banner<I, S>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.line(BANNER_RULE);
        for line in lines {
            self.line(format!("# {}", line.as_ref()));
        }
        self.line(BANNER_RULE)
    }

    /// Blank line followed by a `# ` section heading
    pub fn section(&mut self, heading: &str) -> &mut Self {
        self.blank();
        self.line(format!("# {}", heading))
    }

    pub fn line(&mut self, line: impl AsRef<str>) -> &mut Self {
        self.text.push_str(line.as_ref());
        self.text.push('\n');
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.text.push('\n');
        self
    }

    pub fn finish(self) -> String {
        self.text
    }
}
