// file: src/steps/docker.rs
// version: 1.0.0
// guid: 0f6b3d18-4e92-4a57-bc08-57a2d9e1f364

//! Docker engine and Compose installation

use tracing::info;

use super::{ProvisionStep, StepContext};
use crate::system::ServiceController;
use crate::Result;

/// Installs Docker and the Compose plugin, enables the service and grants
/// the provisioning user access to the engine socket.
pub struct DockerStep;

async fn docker_present(ctx: &StepContext<'_>) -> Result<bool> {
    Ok(ctx.runner.check_silent("docker", &["--version"]).await?
        && ctx.runner.check_silent("docker", &["compose", "version"]).await?)
}

#[async_trait::async_trait]
impl ProvisionStep for DockerStep {
    fn name(&self) -> &str {
        "docker"
    }

    fn description(&self) -> &str {
        "Installing Docker engine and Compose plugin"
    }

    async fn is_satisfied(&self, ctx: &StepContext<'_>) -> Result<bool> {
        if !docker_present(ctx).await? {
            return Ok(false);
        }
        ServiceController::new(ctx.runner).is_active("docker").await
    }

    async fn apply(&self, ctx: &StepContext<'_>) -> Result<()> {
        if !docker_present(ctx).await? {
            info!("Installing Docker packages");
            ctx.runner.run_checked("apt-get", &["update"]).await?;
            ctx.runner
                .run_checked(
                    "apt-get",
                    &["install", "-y", "docker.io", "docker-compose-v2"],
                )
                .await?;
        }

        ServiceController::new(ctx.runner)
            .enable_and_start("docker")
            .await?;

        // Engine socket access for the provisioning user
        ctx.runner
            .run_checked("usermod", &["-aG", "docker", &ctx.config.username])
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validator::Validator;
    use crate::config::{ConfigLoader, Role};
    use crate::system::runner::testing::ScriptedRunner;
    use crate::system::{CommandOutput, HostPaths};

    fn test_ctx_parts() -> (crate::config::ProvisionConfig, HostPaths) {
        let mut settings = ConfigLoader::with_env(Default::default()).load(None).unwrap();
        settings.set("USERNAME", "deploy");
        let config = Validator::new(&settings).validate(Role::ControlPlane).unwrap();
        (config, HostPaths::with_root("/tmp/unused"))
    }

    #[tokio::test]
    async fn test_installs_when_docker_missing() {
        let (config, paths) = test_ctx_parts();
        let runner = ScriptedRunner::new();
        runner.respond("docker --version", CommandOutput::failed(127, ""));
        runner.respond("docker --version", CommandOutput::failed(127, ""));
        runner.respond("docker --version", CommandOutput::ok());

        let ctx = StepContext {
            role: Role::ControlPlane,
            config: &config,
            runner: &runner,
            paths: &paths,
        };

        assert!(!DockerStep.is_satisfied(&ctx).await.unwrap());
        DockerStep.apply(&ctx).await.unwrap();

        let calls = runner.calls();
        assert!(calls.contains(&"apt-get update".to_string()));
        assert!(calls.contains(&"apt-get install -y docker.io docker-compose-v2".to_string()));
        assert!(calls.contains(&"systemctl enable --now docker".to_string()));
        assert!(calls.contains(&"usermod -aG docker deploy".to_string()));
    }

    #[tokio::test]
    async fn test_satisfied_when_installed_and_active() {
        let (config, paths) = test_ctx_parts();
        let runner = ScriptedRunner::new(); // everything succeeds by default

        let ctx = StepContext {
            role: Role::ControlPlane,
            config: &config,
            runner: &runner,
            paths: &paths,
        };
        assert!(DockerStep.is_satisfied(&ctx).await.unwrap());
    }

    #[tokio::test]
    async fn test_inactive_service_means_unsatisfied() {
        let (config, paths) = test_ctx_parts();
        let runner = ScriptedRunner::new();
        runner.respond(
            "systemctl is-active --quiet docker",
            CommandOutput::failed(3, ""),
        );

        let ctx = StepContext {
            role: Role::ControlPlane,
            config: &config,
            runner: &runner,
            paths: &paths,
        };
        assert!(!DockerStep.is_satisfied(&ctx).await.unwrap());
    }
}
