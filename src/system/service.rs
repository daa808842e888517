// file: src/system/service.rs
// version: 1.0.0
// guid: 7a2f9c41-d380-4e69-b7d2-f51a8e03c962

//! Systemd service lifecycle wrapper
//!
//! Enable/start/restart with bounded polling for the active state. All
//! operations block the caller; there is no background supervision.

use std::time::Duration;
use tracing::{debug, info};

use super::runner::CommandRunner;
use crate::{ProvisionError, Result};

/// Total time to wait for a restarted service to report active
pub const RESTART_TIMEOUT_SECS: u64 = 30;
/// Poll interval while waiting
pub const POLL_INTERVAL_SECS: u64 = 1;
/// Journal lines captured when a service fails to come up
const JOURNAL_TAIL_LINES: &str = "20";

/// Service lifecycle operations on top of systemctl
pub struct ServiceController<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> ServiceController<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    pub async fn is_active(&self, service: &str) -> Result<bool> {
        self.runner
            .check_silent("systemctl", &["is-active", "--quiet", service])
            .await
    }

    /// Enable the unit at boot and start it now
    pub async fn enable_and_start(&self, service: &str) -> Result<()> {
        info!("Enabling and starting {}", service);
        self.runner
            .run_checked("systemctl", &["enable", "--now", service])
            .await?;
        Ok(())
    }

    /// Restart the unit and wait for it to report active.
    ///
    /// Polls `systemctl is-active` once per second for up to
    /// [`RESTART_TIMEOUT_SECS`]; on timeout the error carries the recent
    /// journal lines for the unit.
    pub async fn restart(&self, service: &str) -> Result<()> {
        info!("Restarting {}", service);
        self.runner
            .run_checked("systemctl", &["restart", service])
            .await?;
        self.wait_active(service).await
    }

    async fn wait_active(&self, service: &str) -> Result<()> {
        let attempts = RESTART_TIMEOUT_SECS / POLL_INTERVAL_SECS;
        for attempt in 1..=attempts {
            if self.is_active(service).await? {
                debug!("{} active after {} poll(s)", service, attempt);
                return Ok(());
            }
            if attempt < attempts {
                tokio::time::sleep(Duration::from_secs(POLL_INTERVAL_SECS)).await;
            }
        }

        let journal = self.recent_journal(service).await.unwrap_or_default();
        Err(ProvisionError::Service(format!(
            "{} did not become active within {}s; recent log:\n{}",
            service, RESTART_TIMEOUT_SECS, journal
        )))
    }

    /// Capture the tail of the unit's journal for diagnostics
    async fn recent_journal(&self, service: &str) -> Result<String> {
        let output = self
            .runner
            .run(
                "journalctl",
                &["-u", service, "-n", JOURNAL_TAIL_LINES, "--no-pager"],
            )
            .await?;
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::runner::testing::ScriptedRunner;
    use crate::system::runner::CommandOutput;

    #[tokio::test]
    async fn test_enable_and_start() {
        let runner = ScriptedRunner::new();
        let controller = ServiceController::new(&runner);
        controller.enable_and_start("docker").await.unwrap();
        assert_eq!(runner.calls(), vec!["systemctl enable --now docker"]);
    }

    #[tokio::test]
    async fn test_restart_returns_once_active() {
        let runner = ScriptedRunner::new();
        runner.respond("systemctl is-active --quiet ssh", CommandOutput::failed(3, ""));
        runner.respond("systemctl is-active --quiet ssh", CommandOutput::failed(3, ""));
        runner.respond("systemctl is-active --quiet ssh", CommandOutput::ok());

        let controller = ServiceController::new(&runner);
        tokio::time::pause();
        controller.restart("ssh").await.unwrap();
        assert_eq!(runner.call_count("systemctl is-active --quiet ssh"), 3);
    }

    #[tokio::test]
    async fn test_restart_timeout_polls_exact_attempt_count() {
        let runner = ScriptedRunner::new();
        runner.respond(
            "systemctl is-active --quiet fail2ban",
            CommandOutput::failed(3, ""),
        );
        runner.respond(
            "journalctl -u fail2ban -n 20 --no-pager",
            CommandOutput::with_stdout("jail startup error"),
        );

        let controller = ServiceController::new(&runner);
        tokio::time::pause();
        let err = controller.restart("fail2ban").await.unwrap_err();

        // timeout/interval polling attempts, not fewer and not more
        assert_eq!(
            runner.call_count("systemctl is-active --quiet fail2ban"),
            (RESTART_TIMEOUT_SECS / POLL_INTERVAL_SECS) as usize
        );
        match err {
            ProvisionError::Service(message) => {
                assert!(message.contains("jail startup error"));
                assert!(message.contains("30s"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_restart_propagates_restart_failure() {
        let runner = ScriptedRunner::new();
        runner.respond("systemctl restart ssh", CommandOutput::failed(5, "unit masked"));

        let controller = ServiceController::new(&runner);
        let err = controller.restart("ssh").await.unwrap_err();
        assert!(matches!(err, ProvisionError::Command { code: 5, .. }));
        // no polling after a failed restart
        assert_eq!(runner.call_count("systemctl is-active --quiet ssh"), 0);
    }

    #[tokio::test]
    async fn test_is_active_query() {
        let runner = ScriptedRunner::new();
        runner.respond(
            "systemctl is-active --quiet docker",
            CommandOutput::failed(3, ""),
        );

        let controller = ServiceController::new(&runner);
        assert!(!controller.is_active("docker").await.unwrap());
    }
}
