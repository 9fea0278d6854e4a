//! LAN / DHCP / DNS bootstrap script

use super::{Script, LAN_BRIDGE, LAN_PORTS, WAN_INTERFACE};
use crate::client::ClientRecord;
use tracing::debug;

/// Credential every freshly bootstrapped router is reset to
pub const ADMIN_PASSWORD: &str = "StS2021!!";

/// Bridge ether2-5 into the LAN, DHCP client on ether1, DNS, DHCP server,
/// masquerade and admin password reset. Empty when the client has no LAN.
pub fn generate_base_artifact(record: &ClientRecord) -> String {
    let id = record.id();
    let Some(lan) = record.lan_prefix() else {
        debug!("No LAN prefix for {}, skipping base script", id);
        return String::new();
    };
    let dns = record.dns_servers();
    let dhcp = record.dhcp_range();

    debug!("Generating base script for {} (lan {}.0/24)", id, lan);

    let mut script = Script::new();
    script.banner([
        format!("CONFIGURACION BASE PARA CLIENTE: {}", id),
        format!("IP WireGuard: {}", record.tunnel_address()),
        format!("Red LAN: {}.0/24", lan),
    ]);

    script
        .section("1. CONFIGURACION BASICA DE RED")
        .line(format!(
            "/interface bridge add name={} comment=\"Red Local\"",
            LAN_BRIDGE
        ));
    for port in LAN_PORTS {
        script.line(format!(
            "/interface bridge port add bridge={} interface={} comment=\"Puerto LAN\"",
            LAN_BRIDGE, port
        ));
    }

    script
        .section("2. CONFIGURACION IP")
        .line(format!(
            "/ip address add address={}.1/24 interface={} comment=\"IP Router\"",
            lan, LAN_BRIDGE
        ))
        .line(format!(
            "/ip dhcp-client add interface={} disabled=no comment=\"Internet\"",
            WAN_INTERFACE
        ));

    script
        .section("3. CONFIGURACION DNS")
        .line(format!("/ip dns set servers={} allow-remote-requests=yes", dns));

    script
        .section("4. CONFIGURACION DHCP")
        .line(format!(
            "/ip pool add name=pool-lan ranges={lan}.{}-{lan}.{}",
            dhcp.start, dhcp.end
        ))
        .line(format!(
            "/ip dhcp-server add name=dhcp-lan interface={} address-pool=pool-lan disabled=no",
            LAN_BRIDGE
        ))
        .line(format!(
            "/ip dhcp-server network add address={lan}.0/24 gateway={lan}.1 dns-server={}",
            dns
        ));

    script.section("5. CONFIGURACION NAT").line(format!(
        "/ip firewall nat add chain=srcnat out-interface={} action=masquerade comment=\"Internet NAT\"",
        WAN_INTERFACE
    ));

    script
        .section("6. SEGURIDAD BASICA")
        .line(format!("/user set admin password=\"{}\"", ADMIN_PASSWORD));

    script.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routeros::fixtures::record;

    const EXPECTED_MC30: &str = r#"# ================================================================
# CONFIGURACION BASE PARA CLIENTE: MC30
# IP WireGuard: 100.100.100.30
# Red LAN: 192.168.28.0/24
# ================================================================

# 1. CONFIGURACION BASICA DE RED
/interface bridge add name=LAN-Bridge comment="Red Local"
/interface bridge port add bridge=LAN-Bridge interface=ether2 comment="Puerto LAN"
/interface bridge port add bridge=LAN-Bridge interface=ether3 comment="Puerto LAN"
/interface bridge port add bridge=LAN-Bridge interface=ether4 comment="Puerto LAN"
/interface bridge port add bridge=LAN-Bridge interface=ether5 comment="Puerto LAN"

# 2. CONFIGURACION IP
/ip address add address=192.168.28.1/24 interface=LAN-Bridge comment="IP Router"
/ip dhcp-client add interface=ether1 disabled=no comment="Internet"

# 3. CONFIGURACION DNS
/ip dns set servers=8.8.8.8,8.8.4.4 allow-remote-requests=yes

# 4. CONFIGURACION DHCP
/ip pool add name=pool-lan ranges=192.168.28.10-192.168.28.100
/ip dhcp-server add name=dhcp-lan interface=LAN-Bridge address-pool=pool-lan disabled=no
/ip dhcp-server network add address=192.168.28.0/24 gateway=192.168.28.1 dns-server=8.8.8.8,8.8.4.4

# 5. CONFIGURACION NAT
/ip firewall nat add chain=srcnat out-interface=ether1 action=masquerade comment="Internet NAT"

# 6. SEGURIDAD BASICA
/user set admin password="StS2021!!"
"#;

    #[test]
    fn test_base_script_exact() {
        let script = generate_base_artifact(&record(Some("192.168.28"), &[], None));
        assert_eq!(script, EXPECTED_MC30);
    }

    #[test]
    fn test_base_script_empty_without_lan() {
        assert!(generate_base_artifact(&record(None, &[], None)).is_empty());
    }

    #[test]
    fn test_base_script_section_order() {
        let script = generate_base_artifact(&record(Some("10.1.2"), &[], None));
        let positions: Vec<usize> = [
            "# 1. CONFIGURACION BASICA DE RED",
            "# 2. CONFIGURACION IP",
            "# 3. CONFIGURACION DNS",
            "# 4. CONFIGURACION DHCP",
            "# 5. CONFIGURACION NAT",
            "# 6. SEGURIDAD BASICA",
        ]
        .iter()
        .map(|heading| script.find(heading).unwrap())
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
