//! "Safe pulse" tunnel watchdog
//!
//! The watchdog is a scheduled RouterOS script that behaves as a two-state
//! machine, re-evaluated every [`SCHEDULE_INTERVAL`]:
//!
//! - **Stable**: ping the hub [`PING_COUNT`] times. Any reply keeps the
//!   tunnel Stable and only logs.
//! - **Recovering**: entered when every ping is lost. Runs
//!   [`RECOVERY_SEQUENCE`] once: purge stale UDP conntrack entries, then bump
//!   the WireGuard listen port by one and put it back, which makes the kernel
//!   rebuild the socket. The next tick is Stable again whatever happened.
//!
//! The interface is never disabled, so a script dying halfway cannot leave
//! the tunnel down. There is no retry and no verification beyond the next
//! scheduled probe.

use super::{tunnel_interface, Script, HUB_TUNNEL_ADDRESS, WIREGUARD_PORT};
use crate::client::ClientRecord;
use tracing::debug;

pub const SCRIPT_NAME: &str = "auto-heal-wireguard";
pub const SCHEDULER_NAME: &str = "schedule-auto-heal";
pub const SCHEDULE_INTERVAL: &str = "5m";
pub const PING_COUNT: u32 = 5;
pub const PULSE_DELAY: &str = "2s";

const SCRIPT_POLICY: &str = "ftp,reboot,read,write,policy,test,password,sniff,sensitive,romon";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    Stable,
    Recovering,
}

impl WatchdogState {
    /// State after one scheduled tick whose probe got `replies` answers
    pub fn next(self, replies: u32) -> Self {
        match self {
            WatchdogState::Recovering => WatchdogState::Stable,
            WatchdogState::Stable if replies == 0 => WatchdogState::Recovering,
            WatchdogState::Stable => WatchdogState::Stable,
        }
    }

    /// Mutations performed while in this state
    pub fn actions(self) -> &'static [RecoveryStep] {
        match self {
            WatchdogState::Stable => &[],
            WatchdogState::Recovering => &RECOVERY_SEQUENCE,
        }
    }
}

/// One step of the recovery attempt, in script order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStep {
    /// Drop conntrack entries for the WireGuard UDP port
    PurgeConnections,
    /// Remember the interface's current listen port
    ReadListenPort,
    /// Move the listen port to `current + 1`
    PulseListenPort,
    Delay,
    /// Put the original listen port back
    RestoreListenPort,
    LogRecovery,
}

pub const RECOVERY_SEQUENCE: [RecoveryStep; 6] = [
    RecoveryStep::PurgeConnections,
    RecoveryStep::ReadListenPort,
    RecoveryStep::PulseListenPort,
    RecoveryStep::Delay,
    RecoveryStep::RestoreListenPort,
    RecoveryStep::LogRecovery,
];

impl RecoveryStep {
    fn lines(self, tag: &str) -> Vec<String> {
        match self {
            RecoveryStep::PurgeConnections => vec![
                String::new(),
                "# PASO 1: Limpiar conexiones estancadas (Connection Tracking)".to_string(),
                "# A veces UDP se queda \"pegado\" en el firewall".to_string(),
                format!(":log info \"[{}] Limpiando conexiones UDP estancadas...\"", tag),
                format!(
                    "/ip firewall connection remove [find where timeout>0 and dst-address~\":{}\" protocol=udp]",
                    WIREGUARD_PORT
                ),
            ],
            RecoveryStep::ReadListenPort => vec![
                String::new(),
                "# PASO 2: Reinicio Suave del Socket (Pulse)".to_string(),
                "# Cambiamos el puerto de escucha momentaneamente.".to_string(),
                "# Esto obliga al kernel a reiniciar el socket sin deshabilitar la interfaz."
                    .to_string(),
                ":local currentPort [/interface wireguard get [find name=$wgName] listen-port]"
                    .to_string(),
            ],
            RecoveryStep::PulseListenPort => vec![
                ":local tempPort ($currentPort + 1)".to_string(),
                String::new(),
                format!(
                    ":log warning \"[{}] Realizando pulso de puerto ($currentPort -> $tempPort -> $currentPort)\"",
                    tag
                ),
                String::new(),
                "# Cambio temporal".to_string(),
                "/interface wireguard set [find name=$wgName] listen-port=$tempPort".to_string(),
            ],
            RecoveryStep::Delay => vec![format!(":delay {}", PULSE_DELAY)],
            RecoveryStep::RestoreListenPort => vec![
                String::new(),
                "# Restauracion".to_string(),
                "/interface wireguard set [find name=$wgName] listen-port=$currentPort"
                    .to_string(),
            ],
            RecoveryStep::LogRecovery => vec![
                String::new(),
                format!(
                    ":log info \"[{}] Protocolo finalizado. Esperando reconexion...\"",
                    tag
                ),
            ],
        }
    }
}

fn indented(depth: usize, line: &str) -> String {
    if line.is_empty() {
        return String::new();
    }
    format!("{}{}", "    ".repeat(depth), line)
}

/// Monitor script plus its 5-minute scheduler entry
pub fn generate_watchdog_artifact(record: &ClientRecord) -> String {
    let id = record.id();
    let tag = format!("{} Watchdog", id);

    debug!("Generating watchdog script for {}", id);

    let mut script = Script::new();
    script.banner([
        "NUEVO WATCHDOG AUTOMATICO: \"SAFE PULSE\"",
        "Metodo: No apaga la interfaz. Fuerza reinicio de socket cambiando puerto.",
        "Ventaja: Elimina riesgo de que la interfaz quede apagada permanentemente.",
    ]);

    script.section("Script de Auto-Curacion").line(format!(
        "/system script add name={} policy={} source={{",
        SCRIPT_NAME, SCRIPT_POLICY
    ));

    let header = [
        format!(":local wgName \"{}\"", tunnel_interface(id)),
        format!(":local targetIp \"{}\"", HUB_TUNNEL_ADDRESS),
        format!(":local pingCount {}", PING_COUNT),
        String::new(),
        "# Verificamos conectividad".to_string(),
        ":if ([/ping $targetIp count=$pingCount interval=1] = 0) do={".to_string(),
    ];
    for line in &header {
        script.line(indented(1, line));
    }

    // Stable -> Recovering
    script.line(indented(
        2,
        &format!(
            ":log error \"[{}] Conexion perdida con servidor. Iniciando protocolo de recuperacion...\"",
            tag
        ),
    ));
    for step in WatchdogState::Recovering.actions() {
        for line in step.lines(&tag) {
            script.line(indented(2, &line));
        }
    }

    script
        .line(indented(1, "} else={"))
        .line(indented(
            2,
            &format!(":log info \"[{}] Sistema estable. Ping OK.\"", tag),
        ))
        .line(indented(1, "}"))
        .line("}");

    script.section("Scheduler (Ejecuta cada 5 minutos)").line(format!(
        "/system scheduler add name={} interval={} on-event={} start-time=startup \
         comment=\"Watchdog WireGuard Non-Stop\"",
        SCHEDULER_NAME, SCHEDULE_INTERVAL, SCRIPT_NAME
    ));

    script.blank().banner([
        "NOTA: Este metodo NO requiere cambiar el device-mode a disabled",
        "Funciona en modo estandar ya que no modifica configuracion critica de boot.",
    ]);

    script.finish()
}
