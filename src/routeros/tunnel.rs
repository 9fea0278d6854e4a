//! Client-side WireGuard interface, hub peer, route and forward rules

use super::{
    tunnel_interface, Script, HUB_ENDPOINT, HUB_PUBLIC_KEY, HUB_TUNNEL_ADDRESS, LAN_BRIDGE,
    MONITORING_SUBNET, PERSISTENT_KEEPALIVE, WIREGUARD_PORT,
};
use crate::client::ClientRecord;
use tracing::debug;

/// Networks the client accepts from the hub peer
///
/// Always the monitoring subnet and the hub's tunnel `/32`; the LAN `/24`
/// is appended only when a LAN prefix is configured.
pub fn peer_allowed_addresses(record: &ClientRecord) -> String {
    let mut allowed = vec![
        MONITORING_SUBNET.to_string(),
        format!("{}/32", HUB_TUNNEL_ADDRESS),
    ];
    if let Some(lan) = record.lan_prefix() {
        allowed.push(format!("{}.0/24", lan));
    }
    allowed.join(",")
}

pub fn generate_tunnel_artifact(record: &ClientRecord) -> String {
    let id = record.id();
    let iface = tunnel_interface(id);

    debug!("Generating tunnel script for {} on {}", id, iface);

    let mut script = Script::new();
    script.banner([
        format!("CONFIGURACION WIREGUARD PARA CLIENTE: {}", id),
        format!("IP WireGuard: {}", record.tunnel_address()),
    ]);

    script
        .section("CONFIGURACION WIREGUARD")
        .line(format!(
            "/interface wireguard add name={iface} comment=\"WireGuard {id}\" listen-port={}",
            WIREGUARD_PORT
        ))
        .line(format!(
            "/ip address add address={}/24 interface={iface} comment=\"WireGuard IP\"",
            record.tunnel_address()
        ));

    script.section("PEER (SERVIDOR)").line(format!(
        "/interface wireguard peers add interface={iface} name=SERVER-{id} comment=\"Servidor {id}\" \
         public-key=\"{}\" endpoint-address=\"{}\" endpoint-port={} allowed-address=\"{}\" \
         persistent-keepalive={}",
        HUB_PUBLIC_KEY,
        HUB_ENDPOINT,
        WIREGUARD_PORT,
        peer_allowed_addresses(record),
        PERSISTENT_KEEPALIVE
    ));

    script.section("RUTAS").line(format!(
        "/ip route add dst-address={} gateway={} comment=\"Ruta WireGuard\"",
        MONITORING_SUBNET, HUB_TUNNEL_ADDRESS
    ));

    script
        .section("REGLAS FIREWALL")
        .line(format!(
            "/ip firewall filter add chain=forward in-interface={iface} out-interface={} \
             action=accept comment=\"WG->LAN {id}\"",
            LAN_BRIDGE
        ))
        .line(format!(
            "/ip firewall filter add chain=forward in-interface={} out-interface={iface} \
             action=accept comment=\"LAN->WG {id}\"",
            LAN_BRIDGE
        ))
        .line(format!(
            "/ip firewall filter add chain=forward src-address={} in-interface={iface} \
             out-interface={} action=accept comment=\"Monitoreo->LAN {id}\"",
            MONITORING_SUBNET, LAN_BRIDGE
        ));

    script.finish()
}
