// file: src/lib.rs
// version: 1.0.0
// guid: 8b1d4e27-93aa-4f60-b6c5-0d2e91c7f4a2

//! # Swarm Provision Agent
//!
//! Provisions an Ubuntu server into a Docker Swarm role (control-plane or
//! worker): user creation, SSH hardening, fail2ban, UFW firewall policy,
//! Docker/Compose installation and swarm bootstrap.
//!
//! Every provisioning step is idempotent: it checks the current host state
//! and applies changes only when needed, so re-running the agent on an
//! already-converged host is a no-op. Steps run strictly sequentially;
//! concurrent runs against the same host are not supported and must be
//! serialized by the operator.

pub mod cli;
pub mod config;
pub mod error;
pub mod firewall;
pub mod logging;
pub mod steps;
pub mod system;

pub use error::{ProvisionError, Result};

/// Version information for the agent
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
