// file: src/config/validator.rs
// version: 1.0.0
// guid: e1a6b320-4c9d-4f78-a52e-6b3d8c0f912a

//! Configuration validation
//!
//! Pure per-field checks plus the aggregate validation that turns loaded
//! [`Settings`] into a typed [`ProvisionConfig`]. All failures are collected
//! and reported together; no system mutation happens while any field is
//! invalid.

use tracing::error;

use super::loader::Settings;
use super::{Fail2banConfig, ProvisionConfig, Role, SshHardeningConfig};
use crate::{ProvisionError, Result};

/// SSH public key type prefixes accepted in authorized_keys material
const SSH_KEY_TYPES: &[&str] = &[
    "ssh-rsa",
    "ssh-ed25519",
    "ecdsa-sha2-nistp256",
    "ecdsa-sha2-nistp384",
    "ecdsa-sha2-nistp521",
    "sk-ssh-ed25519",
    "sk-ecdsa-sha2-nistp256",
];

/// Validate a dotted-quad IPv4 address
pub fn is_valid_ipv4(value: &str) -> bool {
    let groups: Vec<&str> = value.split('.').collect();
    if groups.len() != 4 {
        return false;
    }
    groups.iter().all(|group| {
        !group.is_empty()
            && group.chars().all(|c| c.is_ascii_digit())
            && group.parse::<u32>().map(|n| n <= 255).unwrap_or(false)
    })
}

/// Validate a TCP/UDP port number
pub fn is_valid_port(value: &str) -> bool {
    matches!(value.parse::<u32>(), Ok(p) if (1..=65535).contains(&p))
}

/// Validate a "positive" integer.
///
/// Matches the historical behavior this tool replaces: only negative and
/// non-numeric values are rejected, so 0 is accepted.
pub fn is_valid_positive_int(value: &str) -> bool {
    value.parse::<i64>().map(|n| n >= 0).unwrap_or(false)
}

/// Validate a Unix username: lowercase letter or underscore, then up to 31
/// of lowercase letters, digits, underscore or hyphen.
pub fn is_valid_username(value: &str) -> bool {
    let mut chars = value.chars();
    let first_ok = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_');
    first_ok
        && value.len() <= 32
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

/// Validate an SSH public key by its leading key-type token
pub fn is_valid_ssh_key(value: &str) -> bool {
    match value.split_whitespace().next() {
        Some(key_type) => SSH_KEY_TYPES.contains(&key_type),
        None => false,
    }
}

/// Aggregate validator producing the typed run configuration
pub struct Validator<'a> {
    settings: &'a Settings,
    errors: Vec<String>,
}

impl<'a> Validator<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            errors: Vec::new(),
        }
    }

    /// Run every check applicable to `role`.
    ///
    /// On failure each offending field is reported on its own line and the
    /// returned error carries the failure count; the caller must not
    /// proceed to the step runner.
    pub fn validate(mut self, role: Role) -> Result<ProvisionConfig> {
        let username = self.field("USERNAME", is_valid_username, "not a valid username");
        let ssh_port = self.port_field("SSH_PORT");
        let findtime = self.count_field("FAIL2BAN_FINDTIME");
        let maxretry = self.count_field("FAIL2BAN_MAXRETRY");
        let bantime = self.count_field("FAIL2BAN_BANTIME");
        let max_auth_tries = self.count_field("SSH_MAX_AUTH_TRIES");
        let client_alive_interval = self.count_field("SSH_CLIENT_ALIVE_INTERVAL");
        let client_alive_count_max = self.count_field("SSH_CLIENT_ALIVE_COUNT_MAX");
        let login_grace_time = self.count_field("SSH_LOGIN_GRACE_TIME");
        let max_startups = self
            .settings
            .get_or_default("SSH_MAX_STARTUPS")
            .to_string();
        let ui_port = self.port_field("CONTROL_PLANE_UI_PORT");
        let prometheus_port = self.port_field("PROMETHEUS_PORT");
        let grafana_port = self.port_field("GRAFANA_PORT");

        let personal_ssh_key = self.optional_key("PERSONAL_SSH_KEY");
        let control_plane_ssh_key = self.optional_key("CONTROL_PLANE_SSH_KEY");

        let control_plane_ip = match self.settings.get("CONTROL_PLANE_IP") {
            Some(ip) if is_valid_ipv4(ip) => Some(ip.to_string()),
            Some(ip) => {
                self.fail("CONTROL_PLANE_IP", ip, "not a valid IPv4 address");
                None
            }
            None if role == Role::Worker => {
                self.fail("CONTROL_PLANE_IP", "<unset>", "required for the worker role");
                None
            }
            None => None,
        };

        let swarm_join_token = self
            .settings
            .get("SWARM_JOIN_TOKEN")
            .map(str::to_string)
            .filter(|t| !t.is_empty());

        if !self.errors.is_empty() {
            for line in &self.errors {
                error!("{}", line);
            }
            return Err(ProvisionError::Validation {
                count: self.errors.len(),
            });
        }

        Ok(ProvisionConfig {
            username,
            ssh_port,
            fail2ban: Fail2banConfig {
                findtime,
                maxretry,
                bantime,
            },
            ssh: SshHardeningConfig {
                max_auth_tries,
                client_alive_interval,
                client_alive_count_max,
                max_startups,
                login_grace_time,
            },
            ui_port,
            prometheus_port,
            grafana_port,
            personal_ssh_key,
            control_plane_ssh_key,
            control_plane_ip,
            swarm_join_token,
        })
    }

    fn fail(&mut self, key: &str, value: &str, reason: &str) {
        self.errors.push(format!("{}={}: {}", key, value, reason));
    }

    fn field(&mut self, key: &str, check: fn(&str) -> bool, reason: &str) -> String {
        let value = self.settings.get_or_default(key).to_string();
        if !check(&value) {
            self.fail(key, &value, reason);
        }
        value
    }

    fn port_field(&mut self, key: &str) -> u16 {
        let value = self.settings.get_or_default(key).to_string();
        if is_valid_port(&value) {
            value.parse().unwrap_or(0)
        } else {
            self.fail(key, &value, "not a valid port (1-65535)");
            0
        }
    }

    fn count_field(&mut self, key: &str) -> u32 {
        let value = self.settings.get_or_default(key).to_string();
        if is_valid_positive_int(&value) {
            value.parse().unwrap_or(0)
        } else {
            self.fail(key, &value, "not a non-negative integer");
            0
        }
    }

    fn optional_key(&mut self, key: &str) -> Option<String> {
        match self.settings.get(key) {
            Some(value) if !value.is_empty() => {
                if !is_valid_ssh_key(value) {
                    self.fail(key, value, "not a recognized SSH public key");
                }
                Some(value.to_string())
            }
            _ => None,
        }
    }
}
