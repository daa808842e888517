// file: src/steps/swarm.rs
// version: 1.0.0
// guid: 2c9e5a70-6f13-4b84-9d26-e0b7f4a8c159

//! Swarm bootstrap: manager initialization and worker join
//!
//! The swarm protocol itself is Docker's business; these steps only shell
//! out to obtain tokens and issue the init/join commands.

use tracing::info;

use super::{ProvisionStep, StepContext};
use crate::config::SWARM_MANAGEMENT_PORT;
use crate::system::net;
use crate::{ProvisionError, Result};

/// Overall time a worker waits for the manager port to come up
const MANAGER_REACHABILITY_TIMEOUT_SECS: u64 = 60;

async fn swarm_state(ctx: &StepContext<'_>) -> Result<String> {
    let output = ctx
        .runner
        .run("docker", &["info", "--format", "{{.Swarm.LocalNodeState}}"])
        .await?;
    Ok(output.stdout_trimmed().to_string())
}

async fn swarm_active(ctx: &StepContext<'_>) -> Result<bool> {
    Ok(swarm_state(ctx).await? == "active")
}

/// Initializes this host as the swarm manager and prints the worker join
/// command.
pub struct SwarmInitStep;

#[async_trait::async_trait]
impl ProvisionStep for SwarmInitStep {
    fn name(&self) -> &str {
        "swarm-init"
    }

    fn description(&self) -> &str {
        "Initializing Docker Swarm manager"
    }

    async fn is_satisfied(&self, ctx: &StepContext<'_>) -> Result<bool> {
        swarm_active(ctx).await
    }

    async fn apply(&self, ctx: &StepContext<'_>) -> Result<()> {
        match ctx.config.control_plane_ip.as_deref() {
            Some(ip) => {
                ctx.runner
                    .run_checked("docker", &["swarm", "init", "--advertise-addr", ip])
                    .await?;
            }
            None => {
                ctx.runner.run_checked("docker", &["swarm", "init"]).await?;
            }
        }

        let token = ctx
            .runner
            .run_checked("docker", &["swarm", "join-token", "-q", "worker"])
            .await?;
        let advertise = ctx
            .config
            .control_plane_ip
            .as_deref()
            .unwrap_or("<this-host>");
        info!(
            "Workers can join with: docker swarm join --token {} {}:{}",
            token.stdout_trimmed(),
            advertise,
            SWARM_MANAGEMENT_PORT
        );
        Ok(())
    }
}

/// Joins this host to the swarm as a worker.
///
/// Waits for the manager port to become reachable first. Without a
/// configured join token the step reports failure after printing the
/// manual join instruction; it is best-effort so the rest of the host is
/// still provisioned.
pub struct SwarmJoinStep;

#[async_trait::async_trait]
impl ProvisionStep for SwarmJoinStep {
    fn name(&self) -> &str {
        "swarm-join"
    }

    fn description(&self) -> &str {
        "Joining Docker Swarm as worker"
    }

    fn fatal(&self) -> bool {
        false
    }

    async fn is_satisfied(&self, ctx: &StepContext<'_>) -> Result<bool> {
        swarm_active(ctx).await
    }

    async fn apply(&self, ctx: &StepContext<'_>) -> Result<()> {
        // Validation guarantees the address for the worker role.
        let manager = ctx
            .config
            .control_plane_ip
            .as_deref()
            .ok_or_else(|| ProvisionError::config("CONTROL_PLANE_IP missing for worker"))?;
        let endpoint = format!("{}:{}", manager, SWARM_MANAGEMENT_PORT);

        let token = match ctx.config.swarm_join_token.as_deref() {
            Some(token) => token,
            None => {
                info!(
                    "No SWARM_JOIN_TOKEN configured; run 'docker swarm join-token worker' \
                     on the control plane, then: docker swarm join --token <token> {}",
                    endpoint
                );
                return Err(ProvisionError::step(
                    self.name(),
                    "join token not configured, join must be completed manually",
                ));
            }
        };

        net::wait_for_port(manager, SWARM_MANAGEMENT_PORT, MANAGER_REACHABILITY_TIMEOUT_SECS)
            .await
            .map_err(|e| ProvisionError::timeout(e.to_string()))?;

        ctx.runner
            .run_checked("docker", &["swarm", "join", "--token", token, &endpoint])
            .await?;
        Ok(())
    }
}
