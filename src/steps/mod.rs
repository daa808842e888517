// file: src/steps/mod.rs
// version: 1.0.0
// guid: 6c1f8a24-05d9-4e7b-93c6-1b8f2d5a7e90

//! Provisioning steps and the sequential step runner
//!
//! A step is a named unit of convergence: a predicate that decides whether
//! the host already satisfies it, and an apply action run only when it does
//! not. Fatal steps abort the remaining run on failure; best-effort steps
//! are recorded and skipped past. Re-running the full plan on a converged
//! host applies nothing.

pub mod docker;
pub mod fail2ban;
pub mod firewall;
pub mod marker;
pub mod ssh;
pub mod swarm;
pub mod user;

use serde::Serialize;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::config::{ProvisionConfig, Role};
use crate::system::{CommandRunner, HostPaths};
use crate::{ProvisionError, Result};

/// Context passed to each provisioning step
pub struct StepContext<'a> {
    pub role: Role,
    pub config: &'a ProvisionConfig,
    pub runner: &'a dyn CommandRunner,
    pub paths: &'a HostPaths,
}

/// Trait for provisioning steps
#[async_trait::async_trait]
pub trait ProvisionStep: Send + Sync {
    /// Short identifier used in logs and reports
    fn name(&self) -> &str;

    /// One-line description of what this step converges
    fn description(&self) -> &str;

    /// Whether a failure aborts the remaining run
    fn fatal(&self) -> bool {
        true
    }

    /// Is the host already in the state this step produces?
    async fn is_satisfied(&self, ctx: &StepContext<'_>) -> Result<bool>;

    /// Converge the host; only called when `is_satisfied` returned false
    async fn apply(&self, ctx: &StepContext<'_>) -> Result<()>;

    /// Post-apply check; defaults to re-evaluating the predicate
    async fn verify(&self, ctx: &StepContext<'_>) -> Result<bool> {
        self.is_satisfied(ctx).await
    }
}

/// Outcome of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepStatus {
    #[serde(rename = "applied")]
    Applied,
    #[serde(rename = "skipped")]
    Skipped,
    #[serde(rename = "failed")]
    Failed,
}

/// Per-step record for the run summary
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub name: String,
    pub status: StepStatus,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of a whole run: every step report plus the aborting failure, if
/// any. Kept separate so the summary can still be printed after an abort.
pub struct RunOutcome {
    pub reports: Vec<StepReport>,
    pub failure: Option<ProvisionError>,
}

impl RunOutcome {
    pub fn applied(&self) -> usize {
        self.count(StepStatus::Applied)
    }

    pub fn skipped(&self) -> usize {
        self.count(StepStatus::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(StepStatus::Failed)
    }

    fn count(&self, status: StepStatus) -> usize {
        self.reports.iter().filter(|r| r.status == status).count()
    }
}

/// Build the ordered step plan for a role.
///
/// Both roles share the hardening and Docker prefix; the swarm stage and
/// the completion marker differ per role.
pub fn plan(role: Role) -> Vec<Box<dyn ProvisionStep>> {
    let mut steps: Vec<Box<dyn ProvisionStep>> = vec![
        Box::new(user::CreateUserStep),
        Box::new(ssh::SshHardeningStep),
        Box::new(fail2ban::Fail2banStep),
        Box::new(firewall::FirewallStep),
        Box::new(docker::DockerStep),
    ];
    match role {
        Role::ControlPlane => steps.push(Box::new(swarm::SwarmInitStep)),
        Role::Worker => steps.push(Box::new(swarm::SwarmJoinStep)),
    }
    steps.push(Box::new(marker::MarkerStep));
    steps
}

/// Executes an ordered step list strictly sequentially
pub struct StepRunner;

impl StepRunner {
    pub async fn run(ctx: &StepContext<'_>, steps: &[Box<dyn ProvisionStep>]) -> RunOutcome {
        let total = steps.len();
        let mut reports = Vec::with_capacity(total);

        for (index, step) in steps.iter().enumerate() {
            let number = index + 1;
            let started = Instant::now();

            let report = match Self::run_step(ctx, step.as_ref(), number, total).await {
                Ok(status) => StepReport {
                    name: step.name().to_string(),
                    status,
                    duration_ms: started.elapsed().as_millis() as u64,
                    error: None,
                },
                Err(e) => {
                    let report = StepReport {
                        name: step.name().to_string(),
                        status: StepStatus::Failed,
                        duration_ms: started.elapsed().as_millis() as u64,
                        error: Some(e.to_string()),
                    };
                    if step.fatal() {
                        error!(
                            "[{}/{}] {} failed, aborting run: {}",
                            number,
                            total,
                            step.name(),
                            e
                        );
                        reports.push(report);
                        return RunOutcome {
                            reports,
                            failure: Some(e),
                        };
                    }
                    warn!(
                        "[{}/{}] {} failed (best-effort), continuing: {}",
                        number,
                        total,
                        step.name(),
                        e
                    );
                    report
                }
            };
            reports.push(report);
        }

        RunOutcome {
            reports,
            failure: None,
        }
    }

    async fn run_step(
        ctx: &StepContext<'_>,
        step: &dyn ProvisionStep,
        number: usize,
        total: usize,
    ) -> Result<StepStatus> {
        if step.is_satisfied(ctx).await? {
            info!(
                "[{}/{}] {} already satisfied, skipping",
                number,
                total,
                step.name()
            );
            return Ok(StepStatus::Skipped);
        }

        info!("[{}/{}] {}", number, total, step.description());
        step.apply(ctx).await?;

        if step.verify(ctx).await? {
            info!("[{}/{}] {} done", number, total, step.name());
            Ok(StepStatus::Applied)
        } else {
            Err(ProvisionError::step(
                step.name(),
                "apply completed but the post-check is still unsatisfied",
            ))
        }
    }
}
