//! Artifact bundles: which scripts a request produces and where they go
//!
//! A [`Profile`] picks the artifacts (everything, tunnel only, DNAT only).
//! Empty artifacts, such as DNAT rules for a client without cameras, are left
//! out of the bundle instead of being exported as empty files.

use crate::client::{ClientError, ClientRecord};
use crate::routeros::{
    generate_base_artifact, generate_camera_urls, generate_port_forwarding_artifact,
    generate_server_provisioning_artifact, generate_tunnel_artifact, generate_watchdog_artifact,
};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("Client error: {0}")]
    ClientError(#[from] ClientError),
    #[error("Failed to write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("Failed to encode bundle as JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Which set of scripts to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Base, tunnel, DNAT, watchdog, server commands and camera URLs
    Complete,
    /// Client tunnel plus server commands
    Tunnel,
    /// Camera port-forwarding only
    Dnat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Base,
    Tunnel,
    PortForwarding,
    Watchdog,
    ServerProvisioning,
    CameraUrls,
}

#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub title: &'static str,
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactBundle {
    pub client: String,
    pub profile: Profile,
    pub artifacts: Vec<Artifact>,
}

impl ArtifactBundle {
    /// Run the generators for `profile`
    ///
    /// Profiles that include DNAT check the camera list first; a missing
    /// address fails the whole request and nothing is produced. The complete
    /// profile also requires a LAN prefix for the base script.
    pub fn generate(record: &ClientRecord, profile: Profile) -> Result<Self, BundleError> {
        if profile == Profile::Complete && record.lan_prefix().is_none() {
            return Err(ClientError::MissingLanPrefix(record.id().to_string()).into());
        }
        if profile != Profile::Tunnel {
            record.check_camera_list()?;
        }

        let id = record.id();
        let plan: Vec<(ArtifactKind, &'static str, String)> = match profile {
            Profile::Complete => vec![
                (
                    ArtifactKind::Base,
                    "Configuración Base (LAN, DHCP, DNS)",
                    format!("{}_01_base.rsc", id),
                ),
                (
                    ArtifactKind::Tunnel,
                    "WireGuard Cliente",
                    format!("{}_02_wireguard.rsc", id),
                ),
                (
                    ArtifactKind::PortForwarding,
                    "Reglas DNAT (Cámaras)",
                    format!("{}_03_dnat.rsc", id),
                ),
                (
                    ArtifactKind::Watchdog,
                    "Watchdog Automático",
                    format!("{}_04_watchdog.rsc", id),
                ),
                (
                    ArtifactKind::ServerProvisioning,
                    "Comandos para el SERVIDOR (Pegar en el Core)",
                    format!("{}_server.rsc", id),
                ),
                (
                    ArtifactKind::CameraUrls,
                    "URLs de Acceso Remoto",
                    format!("{}_urls.txt", id),
                ),
            ],
            Profile::Tunnel => vec![
                (
                    ArtifactKind::Tunnel,
                    "Configuración Cliente",
                    format!("wg_{}.rsc", id),
                ),
                (
                    ArtifactKind::ServerProvisioning,
                    "Comandos Servidor",
                    format!("{}_server.rsc", id),
                ),
            ],
            Profile::Dnat => vec![
                (ArtifactKind::PortForwarding, "Reglas DNAT", format!("dnat_{}.rsc", id)),
            ],
        };

        let artifacts: Vec<Artifact> = plan
            .into_iter()
            .filter_map(|(kind, title, file_name)| {
                let content = render(kind, record);
                if content.is_empty() {
                    debug!("Skipping empty {:?} artifact for {}", kind, id);
                    return None;
                }
                Some(Artifact {
                    kind,
                    title,
                    file_name,
                    content,
                })
            })
            .collect();

        info!(
            "Generated {} artifacts for {} ({:?} profile)",
            artifacts.len(),
            id,
            profile
        );

        Ok(Self {
            client: id.to_string(),
            profile,
            artifacts,
        })
    }

    pub fn get(&self, kind: ArtifactKind) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }

    /// All artifacts concatenated, each under a `#### title (file)` heading
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for (i, artifact) in self.artifacts.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!(
                "#### {} ({})\n\n",
                artifact.title, artifact.file_name
            ));
            out.push_str(&artifact.content);
        }
        out
    }

    pub fn to_json(&self) -> Result<String, BundleError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write every artifact into `dir` under its file name
    pub fn write_to_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, BundleError> {
        fs::create_dir_all(dir).map_err(|source| BundleError::WriteError {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut written = Vec::with_capacity(self.artifacts.len());
        for artifact in &self.artifacts {
            let path = dir.join(&artifact.file_name);
            fs::write(&path, &artifact.content).map_err(|source| BundleError::WriteError {
                path: path.clone(),
                source,
            })?;
            info!("Wrote {}", path.display());
            written.push(path);
        }

        Ok(written)
    }
}

fn render(kind: ArtifactKind, record: &ClientRecord) -> String {
    match kind {
        ArtifactKind::Base => generate_base_artifact(record),
        ArtifactKind::Tunnel => generate_tunnel_artifact(record),
        ArtifactKind::PortForwarding => generate_port_forwarding_artifact(record),
        ArtifactKind::Watchdog => generate_watchdog_artifact(record),
        ArtifactKind::ServerProvisioning => generate_server_provisioning_artifact(record),
        ArtifactKind::CameraUrls => generate_camera_urls(record),
    }
}
