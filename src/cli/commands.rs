// file: src/cli/commands.rs
// version: 1.0.0
// guid: 06e5c3a8-914f-4d70-b2c9-8a1d6f4e0b57

//! Command implementations for the CLI

use colored::Colorize;
use std::path::Path;
use tracing::{info, warn};

use crate::config::{validator::Validator, ConfigLoader, ProvisionConfig, Role};
use crate::firewall::rules_for_role;
use crate::steps::{self, StepContext, StepRunner, StepStatus};
use crate::system::{self, HostPaths, HostRunner};
use crate::{ProvisionError, Result};

/// Load and validate configuration for a role
fn load_config(role: Role, config_path: &str) -> Result<ProvisionConfig> {
    let expanded = shellexpand::tilde(config_path).into_owned();
    let settings = ConfigLoader::new().load(Some(Path::new(&expanded)))?;
    Validator::new(&settings).validate(role)
}

/// Abort unless the host can actually be provisioned
fn check_preconditions() -> Result<()> {
    if !system::is_root() {
        return Err(ProvisionError::precondition(
            "provisioning must run as root",
        ));
    }
    let missing = system::missing_prerequisites();
    if !missing.is_empty() {
        return Err(ProvisionError::precondition(format!(
            "required commands missing: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

/// Provision this host for the given role
pub async fn provision_command(role: Role, config_path: &str, dry_run: bool) -> Result<()> {
    let config = load_config(role, config_path)?;
    let plan = steps::plan(role);

    if dry_run {
        println!("{} provisioning plan for {}:", "DRY RUN".yellow().bold(), role);
        for (index, step) in plan.iter().enumerate() {
            let kind = if step.fatal() { "fatal" } else { "best-effort" };
            println!("  {}. {} [{}] - {}", index + 1, step.name(), kind, step.description());
        }
        println!("\nFirewall rules:");
        for rule in rules_for_role(role, &config) {
            println!("  {}", rule);
        }
        return Ok(());
    }

    check_preconditions()?;
    info!("Provisioning {} role on this host", role);

    let runner = HostRunner;
    let paths = HostPaths::new();
    let ctx = StepContext {
        role,
        config: &config,
        runner: &runner,
        paths: &paths,
    };

    let outcome = StepRunner::run(&ctx, &plan).await;
    print_summary(&outcome.reports);
    info!(
        "Run finished: {} applied, {} skipped, {} failed",
        outcome.applied(),
        outcome.skipped(),
        outcome.failed()
    );

    match outcome.failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn print_summary(reports: &[steps::StepReport]) {
    println!();
    for report in reports {
        let status = match report.status {
            StepStatus::Applied => "applied".green(),
            StepStatus::Skipped => "skipped".dimmed(),
            StepStatus::Failed => "failed".red().bold(),
        };
        match &report.error {
            Some(error) => println!(
                "  {:>7}  {} ({} ms): {}",
                status, report.name, report.duration_ms, error
            ),
            None => println!("  {:>7}  {} ({} ms)", status, report.name, report.duration_ms),
        }
    }
    println!();
}

/// Validate configuration without touching the host
pub async fn validate_command(role: Role, config_path: &str) -> Result<()> {
    let config = load_config(role, config_path)?;
    info!(
        "Configuration valid for {}: user={}, ssh_port={}",
        role, config.username, config.ssh_port
    );
    Ok(())
}

/// Check host prerequisites
pub async fn check_prereqs_command() -> Result<()> {
    if system::is_root() {
        info!("Running as root");
    } else {
        warn!("Not running as root; provisioning will refuse to start");
    }

    let missing = system::missing_prerequisites();
    for cmd in system::REQUIRED_COMMANDS {
        if missing.iter().any(|m| m == cmd) {
            println!("  {}  {}", "missing".red().bold(), cmd);
        } else {
            println!("  {}  {}", "ok".green(), cmd);
        }
    }

    if missing.is_empty() {
        info!("All prerequisites satisfied");
        Ok(())
    } else {
        Err(ProvisionError::precondition(format!(
            "required commands missing: {}",
            missing.join(", ")
        )))
    }
}

/// Show the firewall rule set computed for a role
pub async fn show_firewall_command(role: Role, config_path: &str, json: bool) -> Result<()> {
    let config = load_config(role, config_path)?;
    let rules = rules_for_role(role, &config);

    if json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
    } else {
        println!("Firewall rules for {}:", role);
        for rule in rules {
            println!("  {}", rule);
        }
    }
    Ok(())
}
