//! MikroTik WireGuard generator - RouterOS scripts for remote camera sites
//!
//! Turns a short client description (ID, tunnel suffix, LAN, cameras) into
//! the RouterOS scripts needed to bring a remote router onto the WireGuard
//! hub and expose its cameras through the tunnel. Generation is pure: no
//! device is contacted and nothing is stored.
//!
//! # Architecture
//!
//! - `client`: ID normalization, numeric validation, derived addresses/ports
//! - `routeros`: one generator per script (base, tunnel, DNAT, watchdog, hub)
//! - `bundle`: generation profiles, file naming and export
//! - `config`: Client description file (TOML)
//!
//! # Usage
//!
//! ```bash
//! mikrotik-wg-gen init
//! mikrotik-wg-gen generate --out-dir ./scripts
//! ```

pub mod bundle;
pub mod client;
pub mod config;
pub mod routeros;

pub use bundle::{Artifact, ArtifactBundle, ArtifactKind, BundleError, Profile};
pub use client::{
    derive_values, normalize_identifier, ClientError, ClientId, ClientRecord, RawClient,
};
pub use config::Config;
