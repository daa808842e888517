// file: src/steps/ssh.rs
// version: 1.0.0
// guid: 4e0a7c35-92b8-4d16-a5f3-c8d17e6b0f42

//! sshd hardening via a managed drop-in config

use tokio::fs;
use tracing::info;

use super::{ProvisionStep, StepContext};
use crate::system::ServiceController;
use crate::Result;

const MANAGED_HEADER: &str = "# Managed by swarm-provision-agent; do not edit.";

/// Render the hardening drop-in from the validated configuration
pub fn render_dropin(config: &crate::config::ProvisionConfig) -> String {
    format!(
        "{header}\nPort {port}\nPermitRootLogin no\nPasswordAuthentication no\n\
         PubkeyAuthentication yes\nMaxAuthTries {max_auth}\nClientAliveInterval {alive_interval}\n\
         ClientAliveCountMax {alive_count}\nMaxStartups {max_startups}\n\
         LoginGraceTime {grace}\nX11Forwarding no\n",
        header = MANAGED_HEADER,
        port = config.ssh_port,
        max_auth = config.ssh.max_auth_tries,
        alive_interval = config.ssh.client_alive_interval,
        alive_count = config.ssh.client_alive_count_max,
        max_startups = config.ssh.max_startups,
        grace = config.ssh.login_grace_time,
    )
}

/// Writes the sshd hardening drop-in, checks it with `sshd -t` and restarts
/// the daemon. Satisfied when the drop-in already matches the rendered
/// configuration, so config changes re-convergence on the next run.
pub struct SshHardeningStep;

#[async_trait::async_trait]
impl ProvisionStep for SshHardeningStep {
    fn name(&self) -> &str {
        "ssh-hardening"
    }

    fn description(&self) -> &str {
        "Hardening sshd configuration"
    }

    async fn is_satisfied(&self, ctx: &StepContext<'_>) -> Result<bool> {
        let path = ctx.paths.sshd_dropin();
        match fs::read_to_string(&path).await {
            Ok(current) => Ok(current == render_dropin(ctx.config)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn apply(&self, ctx: &StepContext<'_>) -> Result<()> {
        let path = ctx.paths.sshd_dropin();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        info!("Writing sshd drop-in {}", path.display());
        fs::write(&path, render_dropin(ctx.config)).await?;

        // Refuse to restart sshd with a broken config.
        ctx.runner.run_checked("sshd", &["-t"]).await?;

        ServiceController::new(ctx.runner).restart("ssh").await
    }
}
