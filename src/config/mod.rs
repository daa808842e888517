// file: src/config/mod.rs
// version: 1.0.0
// guid: a4c8f219-6e3b-4d57-8a90-1f5b2c7d9e04

//! Configuration module for the Swarm provisioning agent
//!
//! Handles loading dotenv-style settings and validating them into the typed
//! configuration consumed by the provisioning steps.

pub mod loader;
pub mod validator;

pub use loader::{ConfigLoader, Settings};

use serde::{Deserialize, Serialize};

/// Well-known Docker swarm ports
pub const SWARM_MANAGEMENT_PORT: u16 = 2377;
pub const SWARM_DISCOVERY_PORT: u16 = 7946;
pub const SWARM_OVERLAY_PORT: u16 = 4789;

/// Docker remote API ports that must always be denied at the firewall
pub const DOCKER_API_PLAIN_PORT: u16 = 2375;
pub const DOCKER_API_TLS_PORT: u16 = 2376;

/// Provisioning role for a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "control-plane")]
    ControlPlane,
    #[serde(rename = "worker")]
    Worker,
}

impl Role {
    /// Get the role as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::ControlPlane => "control-plane",
            Role::Worker => "worker",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = crate::error::ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "control-plane" | "manager" => Ok(Role::ControlPlane),
            "worker" => Ok(Role::Worker),
            _ => Err(crate::error::ProvisionError::config(format!(
                "Unknown role: {}",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fail2ban sshd jail settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fail2banConfig {
    /// Window in seconds in which failures are counted
    pub findtime: u32,
    /// Failures within the window before a ban
    pub maxretry: u32,
    /// Ban duration in seconds
    pub bantime: u32,
}

/// sshd hardening parameters written to the drop-in config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshHardeningConfig {
    pub max_auth_tries: u32,
    pub client_alive_interval: u32,
    pub client_alive_count_max: u32,
    /// MaxStartups triple, e.g. "10:30:60"
    pub max_startups: String,
    pub login_grace_time: u32,
}

/// Validated, immutable configuration for one provisioning run.
///
/// Built once by the validator from loaded [`Settings`]; no component
/// mutates it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionConfig {
    /// Account created and hardened on the host
    pub username: String,
    /// Port sshd listens on
    pub ssh_port: u16,
    pub fail2ban: Fail2banConfig,
    pub ssh: SshHardeningConfig,
    /// Management UI port admitted on the control plane
    pub ui_port: u16,
    pub prometheus_port: u16,
    pub grafana_port: u16,
    /// Operator public key installed into authorized_keys
    pub personal_ssh_key: Option<String>,
    /// Control-plane public key installed on workers
    pub control_plane_ssh_key: Option<String>,
    /// Address of the swarm manager; required for the worker role
    pub control_plane_ip: Option<String>,
    /// Worker join token; when absent the join command is only printed
    pub swarm_join_token: Option<String>,
}
