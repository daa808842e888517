// file: src/main.rs
// version: 1.0.0
// guid: c2d8f491-6b07-4e35-a1d9-30f5c8b2e764

//! Swarm Provision Agent - Main entry point

use clap::Parser;
use swarm_provision_agent::{
    cli::{args::Cli, args::Commands, commands::*},
    logging::logger,
    Result,
};
use tokio::signal;
use tracing::{error, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init_logger(cli.verbose, cli.quiet) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    // A half-applied step list is recovered by re-running the tool, so an
    // interrupt just stops the run.
    let shutdown_signal = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
        warn!("Received Ctrl+C, stopping; re-run to resume convergence");
    };

    let command_future = run_command(cli);

    let result: Result<()> = tokio::select! {
        result = command_future => result,
        _ = shutdown_signal => {
            std::process::exit(130); // Standard exit code for Ctrl+C
        }
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Provision { role, config, dry_run } => {
            provision_command(role.into(), &config, dry_run).await
        }
        Commands::Validate { role, config } => validate_command(role.into(), &config).await,
        Commands::CheckPrereqs => check_prereqs_command().await,
        Commands::ShowFirewall { role, config, json } => {
            show_firewall_command(role.into(), &config, json).await
        }
    }
}
