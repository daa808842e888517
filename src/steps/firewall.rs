// file: src/steps/firewall.rs
// version: 1.0.0
// guid: a5f1e083-7c46-4d29-b8a1-62e9d0c4f817

//! Firewall policy application step

use super::{ProvisionStep, StepContext};
use crate::firewall::{rules_for_role, UfwFirewall};
use crate::Result;

/// Applies the role's firewall policy through ufw.
///
/// The policy is re-asserted on every run; ufw skips rules that already
/// exist, so the resulting rule set is stable across runs.
pub struct FirewallStep;

#[async_trait::async_trait]
impl ProvisionStep for FirewallStep {
    fn name(&self) -> &str {
        "firewall"
    }

    fn description(&self) -> &str {
        "Applying firewall policy"
    }

    async fn is_satisfied(&self, _ctx: &StepContext<'_>) -> Result<bool> {
        Ok(false)
    }

    async fn apply(&self, ctx: &StepContext<'_>) -> Result<()> {
        let rules = rules_for_role(ctx.role, ctx.config);
        UfwFirewall::new(ctx.runner).apply(&rules).await
    }

    async fn verify(&self, ctx: &StepContext<'_>) -> Result<bool> {
        UfwFirewall::new(ctx.runner).is_active().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validator::Validator;
    use crate::config::{ConfigLoader, Role};
    use crate::system::runner::testing::ScriptedRunner;
    use crate::system::{CommandOutput, HostPaths};

    #[tokio::test]
    async fn test_worker_apply_emits_scoped_rules_and_denies() {
        let mut settings = ConfigLoader::with_env(Default::default()).load(None).unwrap();
        settings.set("CONTROL_PLANE_IP", "10.0.0.5");
        let config = Validator::new(&settings).validate(Role::Worker).unwrap();

        let runner = ScriptedRunner::new();
        runner.respond("ufw status", CommandOutput::with_stdout("Status: active\n"));
        let paths = HostPaths::with_root("/tmp/unused");
        let ctx = StepContext {
            role: Role::Worker,
            config: &config,
            runner: &runner,
            paths: &paths,
        };

        assert!(!FirewallStep.is_satisfied(&ctx).await.unwrap());
        FirewallStep.apply(&ctx).await.unwrap();
        assert!(FirewallStep.verify(&ctx).await.unwrap());

        let calls = runner.calls();
        assert!(calls.contains(
            &"ufw allow from 10.0.0.5 to any port 2377 proto tcp comment swarm management"
                .to_string()
        ));
        assert!(calls.contains(&"ufw deny 2375/tcp comment docker api plaintext".to_string()));
        assert!(calls.contains(&"ufw deny 2376/tcp comment docker api tls".to_string()));
        assert!(calls.contains(&"ufw --force enable".to_string()));
        assert!(calls.contains(&"ufw reload".to_string()));
        // no web ports on a worker
        assert!(!calls.iter().any(|c| c.contains("80/tcp") || c.contains("443/tcp")));
    }
}
