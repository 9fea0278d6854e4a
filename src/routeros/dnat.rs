//! Camera port-forwarding (DNAT) rules
//!
//! Every camera gets six `dstnat` rules: HTTP over TCP, RTSP over TCP and
//! RTSP over UDP, each reachable both through the tunnel interface and from
//! the monitoring subnet. All rules match the client's tunnel address as
//! destination.

use super::{tunnel_interface, Script, MONITORING_SUBNET};
use crate::client::{CameraPorts, ClientId, ClientRecord};
use std::fmt;
use std::net::Ipv4Addr;
use tracing::{debug, info};

pub const CAMERA_HTTP_PORT: u16 = 80;
pub const CAMERA_RTSP_PORT: u16 = 554;

/// Where forwarded traffic is accepted from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingress {
    /// Anything arriving on the client's WireGuard interface
    Tunnel,
    /// Anything sourced from the monitoring subnet
    Monitoring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => f.write_str("tcp"),
            Protocol::Udp => f.write_str("udp"),
        }
    }
}

/// One `/ip firewall nat` dstnat rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NatRule<'a> {
    pub camera: u8,
    pub ingress: Ingress,
    pub protocol: Protocol,
    pub dst_port: u16,
    pub to_address: &'a str,
    pub to_port: u16,
    pub tag: &'static str,
}

impl NatRule<'_> {
    fn render(&self, id: &ClientId, tunnel_address: Ipv4Addr) -> String {
        let matcher = match self.ingress {
            Ingress::Tunnel => format!("in-interface={}", tunnel_interface(id)),
            Ingress::Monitoring => format!("src-address={}", MONITORING_SUBNET),
        };
        format!(
            "/ip firewall nat add chain=dstnat {} dst-address={} protocol={} dst-port={} \
             action=dst-nat to-addresses={} to-ports={} comment=\"{} Cam{} {}\"",
            matcher,
            tunnel_address,
            self.protocol,
            self.dst_port,
            self.to_address,
            self.to_port,
            self.tag,
            self.camera,
            id
        )
    }
}

/// The six rules for camera `n`, in emission order
pub fn camera_rules(n: u8, address: &str, ports: CameraPorts) -> [NatRule<'_>; 6] {
    let rule = |ingress, protocol, dst_port, to_port, tag| NatRule {
        camera: n,
        ingress,
        protocol,
        dst_port,
        to_address: address,
        to_port,
        tag,
    };

    [
        rule(Ingress::Tunnel, Protocol::Tcp, ports.http, CAMERA_HTTP_PORT, "HTTP"),
        rule(Ingress::Monitoring, Protocol::Tcp, ports.http, CAMERA_HTTP_PORT, "HTTP-MON"),
        rule(Ingress::Tunnel, Protocol::Tcp, ports.rtsp, CAMERA_RTSP_PORT, "RTSP"),
        rule(Ingress::Monitoring, Protocol::Tcp, ports.rtsp, CAMERA_RTSP_PORT, "RTSP-MON"),
        rule(Ingress::Tunnel, Protocol::Udp, ports.rtsp, CAMERA_RTSP_PORT, "RTSP-UDP"),
        rule(Ingress::Monitoring, Protocol::Udp, ports.rtsp, CAMERA_RTSP_PORT, "RTSP-UDP-MON"),
    ]
}

/// DNAT rules for every camera, or an empty string when DNAT is off or the
/// camera list is incomplete
pub fn generate_port_forwarding_artifact(record: &ClientRecord) -> String {
    let Some(cameras) = record.cameras() else {
        debug!("DNAT disabled for {}, no port-forwarding rules", record.id());
        return String::new();
    };
    if !cameras.is_complete() {
        debug!("Camera list for {} is incomplete, skipping DNAT", record.id());
        return String::new();
    }

    let id = record.id();
    let tunnel_address = record.tunnel_address();

    let mut script = Script::new();
    script.banner([
        format!("CONFIGURACION DNAT PARA CAMARAS {}", cameras.vendor),
        format!("Cliente: {}", id),
        format!("Base de puertos: {}", cameras.ports.base()),
    ]);

    for (n, address, ports) in cameras.cameras() {
        script.section(&format!("Camara {} ({})", n, address));
        for rule in camera_rules(n, address, ports) {
            script.line(rule.render(id, tunnel_address));
        }
    }

    info!(
        "Generated {} DNAT rules for {} cameras of {}",
        usize::from(cameras.count) * 6,
        cameras.count,
        id
    );

    script.finish()
}
