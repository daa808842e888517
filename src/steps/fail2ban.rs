// file: src/steps/fail2ban.rs
// version: 1.0.0
// guid: 8d2c6f04-1a9e-4b73-85d0-f3e8a1c5b729

//! fail2ban installation and sshd jail configuration

use tokio::fs;
use tracing::info;

use super::{ProvisionStep, StepContext};
use crate::system::ServiceController;
use crate::Result;

/// Render the sshd jail override
pub fn render_jail(config: &crate::config::ProvisionConfig) -> String {
    format!(
        "[sshd]\nenabled = true\nport = {port}\nbanaction = ufw\nfindtime = {findtime}\n\
         maxretry = {maxretry}\nbantime = {bantime}\n",
        port = config.ssh_port,
        findtime = config.fail2ban.findtime,
        maxretry = config.fail2ban.maxretry,
        bantime = config.fail2ban.bantime,
    )
}

/// Installs fail2ban, writes the sshd jail and restarts the service.
///
/// Best-effort: a fail2ban problem leaves the host less protected but
/// functional, so it does not abort the rest of the run.
pub struct Fail2banStep;

async fn package_installed(ctx: &StepContext<'_>) -> Result<bool> {
    ctx.runner.check_silent("dpkg", &["-s", "fail2ban"]).await
}

#[async_trait::async_trait]
impl ProvisionStep for Fail2banStep {
    fn name(&self) -> &str {
        "fail2ban"
    }

    fn description(&self) -> &str {
        "Configuring fail2ban sshd jail"
    }

    fn fatal(&self) -> bool {
        false
    }

    async fn is_satisfied(&self, ctx: &StepContext<'_>) -> Result<bool> {
        if !package_installed(ctx).await? {
            return Ok(false);
        }
        match fs::read_to_string(ctx.paths.fail2ban_jail()).await {
            Ok(current) => Ok(current == render_jail(ctx.config)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn apply(&self, ctx: &StepContext<'_>) -> Result<()> {
        if !package_installed(ctx).await? {
            info!("Installing fail2ban");
            ctx.runner
                .run_checked("apt-get", &["install", "-y", "fail2ban"])
                .await?;
        }

        let path = ctx.paths.fail2ban_jail();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        info!("Writing fail2ban jail {}", path.display());
        fs::write(&path, render_jail(ctx.config)).await?;

        let services = ServiceController::new(ctx.runner);
        services.enable_and_start("fail2ban").await?;
        services.restart("fail2ban").await
    }
}
