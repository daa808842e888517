// file: src/firewall/ufw.rs
// version: 1.0.0
// guid: f3a1d5c7-8e29-4670-b1a8-04c9e6d2f385

//! UFW rule application

use tracing::{debug, info};

use super::FirewallRule;
use crate::system::CommandRunner;
use crate::Result;

/// Applies declarative rules through the ufw CLI.
///
/// ufw itself skips rules that already exist, so re-applying a policy is a
/// no-op at the netfilter level.
pub struct UfwFirewall<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> UfwFirewall<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Apply the rule set, then enable and reload ufw
    pub async fn apply(&self, rules: &[FirewallRule]) -> Result<()> {
        info!("Applying {} firewall rule(s)", rules.len());
        for rule in rules {
            let args = rule.ufw_args();
            let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
            debug!("ufw {}", args.join(" "));
            self.runner.run_checked("ufw", &arg_refs).await?;
        }

        // --force answers the interactive enable prompt
        self.runner.run_checked("ufw", &["--force", "enable"]).await?;
        self.runner.run_checked("ufw", &["reload"]).await?;
        Ok(())
    }

    /// Whether ufw reports itself active
    pub async fn is_active(&self) -> Result<bool> {
        let output = self.runner.run("ufw", &["status"]).await?;
        Ok(output.success() && output.stdout.contains("Status: active"))
    }
}
