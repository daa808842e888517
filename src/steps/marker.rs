// file: src/steps/marker.rs
// version: 1.0.0
// guid: e7b0c946-3d52-4f18-a96b-84c1f5d0e273

//! Completion marker for external callers

use chrono::Utc;
use tokio::fs;
use tracing::info;

use super::{ProvisionStep, StepContext};
use crate::Result;

/// Writes the role's completion marker file. External tooling polls for
/// this file to learn that provisioning finished.
pub struct MarkerStep;

#[async_trait::async_trait]
impl ProvisionStep for MarkerStep {
    fn name(&self) -> &str {
        "completion-marker"
    }

    fn description(&self) -> &str {
        "Writing completion marker"
    }

    fn fatal(&self) -> bool {
        false
    }

    async fn is_satisfied(&self, ctx: &StepContext<'_>) -> Result<bool> {
        Ok(ctx.paths.marker_file(ctx.role).exists())
    }

    async fn apply(&self, ctx: &StepContext<'_>) -> Result<()> {
        fs::create_dir_all(ctx.paths.marker_dir()).await?;
        let path = ctx.paths.marker_file(ctx.role);
        let content = format!(
            "role={}\ncompleted_at={}\nagent_version={}\n",
            ctx.role.as_str(),
            Utc::now().to_rfc3339(),
            crate::VERSION,
        );
        fs::write(&path, content).await?;
        info!("Wrote completion marker {}", path.display());
        Ok(())
    }
}
