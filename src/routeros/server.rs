//! Hub-side peer registration for a new client

use super::{Script, HUB_INTERFACE, PERSISTENT_KEEPALIVE};
use crate::client::ClientRecord;
use tracing::{debug, warn};

/// Marker left in place of a missing client public key
pub const PUBLIC_KEY_PLACEHOLDER: &str = "[INSERTAR_CLAVE_PUBLICA]";

/// Client tunnel `/32`, plus the LAN `/24` when one is configured
pub fn server_allowed_addresses(record: &ClientRecord) -> String {
    let mut allowed = vec![format!("{}/32", record.tunnel_address())];
    if let Some(lan) = record.lan_prefix() {
        allowed.push(format!("{}.0/24", lan));
    }
    allowed.join(",")
}

pub fn generate_server_provisioning_artifact(record: &ClientRecord) -> String {
    let id = record.id();

    let public_key = match record.public_key() {
        Some(key) => key,
        None => {
            warn!("No public key for {}, leaving placeholder in server commands", id);
            PUBLIC_KEY_PLACEHOLDER
        }
    };
    debug!("Generating server commands for {}", id);

    let mut header = vec![
        "COMANDOS PARA EL SERVIDOR WIREGUARD".to_string(),
        format!("Cliente: {}", id),
        format!("IP: {}", record.tunnel_address()),
    ];
    if let Some(key) = record.public_key() {
        header.push(format!("Llave Publica: {}", key));
    }

    let mut script = Script::new();
    script.banner(header);

    script.section("Agregar Peer").line(format!(
        "/interface wireguard peers add interface={} name={id} comment=\"{id} / IP {}\" \
         public-key=\"{}\" allowed-address={} persistent-keepalive={}",
        HUB_INTERFACE,
        record.tunnel_suffix(),
        public_key,
        server_allowed_addresses(record),
        PERSISTENT_KEEPALIVE
    ));

    if let Some(lan) = record.lan_prefix() {
        script.section("Agregar Ruta").line(format!(
            "/ip route add dst-address={}.0/24 gateway={} comment=\"Ruta {}\"",
            lan,
            record.tunnel_address(),
            id
        ));
    }

    script.finish()
}
