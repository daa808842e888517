// file: src/system/mod.rs
// version: 1.0.0
// guid: 2e6a0d53-9b14-47c8-a3f6-08d1e5b9c274

//! Host-level plumbing: command execution, service control, reachability
//! checks and filesystem locations.

pub mod net;
pub mod runner;
pub mod service;

pub use runner::{CommandOutput, CommandRunner, HostRunner};
pub use service::ServiceController;

use std::path::PathBuf;

use crate::config::Role;

/// Commands that must be present before provisioning starts
pub const REQUIRED_COMMANDS: &[&str] = &["apt-get", "systemctl", "ufw", "sshd"];

/// Check if running as root
pub fn is_root() -> bool {
    #[cfg(unix)]
    {
        unsafe { libc::getuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}

/// Return the required commands missing from PATH
pub fn missing_prerequisites() -> Vec<String> {
    REQUIRED_COMMANDS
        .iter()
        .filter(|cmd| which::which(**cmd).is_err())
        .map(|cmd| cmd.to_string())
        .collect()
}

/// Filesystem locations written by provisioning steps.
///
/// Rooted at `/` on a real host; tests point the root at a temp directory
/// so steps can be exercised without touching the system.
#[derive(Debug, Clone)]
pub struct HostPaths {
    root: PathBuf,
}

impl HostPaths {
    pub fn new() -> Self {
        Self::with_root("/")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// sshd hardening drop-in
    pub fn sshd_dropin(&self) -> PathBuf {
        self.root.join("etc/ssh/sshd_config.d/99-swarm-hardening.conf")
    }

    /// fail2ban jail override
    pub fn fail2ban_jail(&self) -> PathBuf {
        self.root.join("etc/fail2ban/jail.local")
    }

    /// Home directory for a provisioned user
    pub fn home_dir(&self, username: &str) -> PathBuf {
        self.root.join("home").join(username)
    }

    /// `.ssh` directory for a provisioned user
    pub fn ssh_dir(&self, username: &str) -> PathBuf {
        self.home_dir(username).join(".ssh")
    }

    /// authorized_keys file for a provisioned user
    pub fn authorized_keys(&self, username: &str) -> PathBuf {
        self.ssh_dir(username).join("authorized_keys")
    }

    /// Directory holding completion markers
    pub fn marker_dir(&self) -> PathBuf {
        self.root.join("var/lib/swarm-provision")
    }

    /// Completion marker for a role
    pub fn marker_file(&self, role: Role) -> PathBuf {
        self.marker_dir().join(format!("provisioned-{}", role.as_str()))
    }
}

impl Default for HostPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_under_root() {
        let paths = HostPaths::with_root("/tmp/test-root");
        assert_eq!(
            paths.sshd_dropin(),
            PathBuf::from("/tmp/test-root/etc/ssh/sshd_config.d/99-swarm-hardening.conf")
        );
        assert_eq!(
            paths.authorized_keys("deploy"),
            PathBuf::from("/tmp/test-root/home/deploy/.ssh/authorized_keys")
        );
        assert_eq!(
            paths.marker_file(Role::Worker),
            PathBuf::from("/tmp/test-root/var/lib/swarm-provision/provisioned-worker")
        );
    }
}
