// file: src/cli/args.rs
// version: 1.0.0
// guid: 74a9d1e6-0c38-4b52-8e17-f4b6a2c90d35

//! Command line argument definitions

use crate::config::Role;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "swarm-provision-agent")]
#[command(about = "Provision Ubuntu servers into Docker Swarm roles")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Provision this host for the given role
    Provision {
        #[arg(short, long, value_enum)]
        role: RoleArg,

        #[arg(short, long, default_value = ".env", help = "Dotenv-style configuration file")]
        config: String,

        #[arg(long, help = "Show the step plan and firewall rules without applying anything")]
        dry_run: bool,
    },

    /// Validate configuration without touching the host
    Validate {
        #[arg(short, long, value_enum)]
        role: RoleArg,

        #[arg(short, long, default_value = ".env")]
        config: String,
    },

    /// Check host prerequisites (root, apt, systemctl, ufw, sshd)
    CheckPrereqs,

    /// Show the firewall rule set computed for a role
    ShowFirewall {
        #[arg(short, long, value_enum)]
        role: RoleArg,

        #[arg(short, long, default_value = ".env")]
        config: String,

        #[arg(short, long)]
        json: bool,
    },
}

/// Role argument for the CLI
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum RoleArg {
    ControlPlane,
    Worker,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::ControlPlane => Role::ControlPlane,
            RoleArg::Worker => Role::Worker,
        }
    }
}
