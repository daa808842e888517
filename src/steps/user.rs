// file: src/steps/user.rs
// version: 1.0.0
// guid: 1b7d4f92-6a38-4c05-b2e1-9d0c5f8a3e67

//! User account creation and SSH key installation

use tokio::fs;
use tracing::{debug, info};

use super::{ProvisionStep, StepContext};
use crate::Result;

/// Creates the provisioning user, its `.ssh` directory and the configured
/// authorized keys. The `.ssh` directory is created with its final mode;
/// there is never a window where it exists world-readable.
pub struct CreateUserStep;

/// Public keys the configuration asks to install
fn configured_keys<'a>(ctx: &'a StepContext<'_>) -> Vec<&'a str> {
    let mut keys = Vec::new();
    if let Some(key) = ctx.config.personal_ssh_key.as_deref() {
        keys.push(key);
    }
    if let Some(key) = ctx.config.control_plane_ssh_key.as_deref() {
        keys.push(key);
    }
    keys
}

async fn user_exists(ctx: &StepContext<'_>) -> Result<bool> {
    ctx.runner.check_silent("id", &["-u", &ctx.config.username]).await
}

async fn installed_keys(ctx: &StepContext<'_>) -> Result<Vec<String>> {
    let path = ctx.paths.authorized_keys(&ctx.config.username);
    match fs::read_to_string(&path).await {
        Ok(content) => Ok(content.lines().map(str::to_string).collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait::async_trait]
impl ProvisionStep for CreateUserStep {
    fn name(&self) -> &str {
        "create-user"
    }

    fn description(&self) -> &str {
        "Creating the provisioning user and installing SSH keys"
    }

    async fn is_satisfied(&self, ctx: &StepContext<'_>) -> Result<bool> {
        if !user_exists(ctx).await? {
            return Ok(false);
        }
        let installed = installed_keys(ctx).await?;
        Ok(configured_keys(ctx)
            .iter()
            .all(|key| installed.iter().any(|line| line == key)))
    }

    async fn apply(&self, ctx: &StepContext<'_>) -> Result<()> {
        let username = &ctx.config.username;

        if !user_exists(ctx).await? {
            info!("Creating user {}", username);
            ctx.runner
                .run_checked(
                    "useradd",
                    &["-m", "-s", "/bin/bash", "-G", "sudo", username],
                )
                .await?;
        } else {
            debug!("User {} already exists", username);
        }

        let ssh_dir = ctx.paths.ssh_dir(username);
        if !ssh_dir.exists() {
            let mut builder = fs::DirBuilder::new();
            builder.recursive(true);
            #[cfg(unix)]
            {
                builder.mode(0o700);
            }
            builder.create(&ssh_dir).await?;
        }

        let installed = installed_keys(ctx).await?;
        let missing: Vec<&str> = configured_keys(ctx)
            .into_iter()
            .filter(|key| !installed.iter().any(|line| line == key))
            .collect();

        if !missing.is_empty() {
            info!("Installing {} SSH key(s) for {}", missing.len(), username);
            let mut options = fs::OpenOptions::new();
            options.create(true).append(true);
            #[cfg(unix)]
            {
                options.mode(0o600);
            }
            let mut file = options.open(ctx.paths.authorized_keys(username)).await?;
            use tokio::io::AsyncWriteExt;
            for key in missing {
                file.write_all(key.as_bytes()).await?;
                file.write_all(b"\n").await?;
            }
            file.flush().await?;
        }

        let owner = format!("{}:{}", username, username);
        ctx.runner
            .run_checked(
                "chown",
                &["-R", &owner, &ssh_dir.to_string_lossy()],
            )
            .await?;

        Ok(())
    }
}
