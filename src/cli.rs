// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "slipway")]
#[command(about = "Deployment orchestration for self-hosted application platforms")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new slipway.yml deployment manifest
    Init {
        /// Overwrite an existing manifest
        #[arg(long)]
        force: bool,
    },

    /// Run one deployment attempt against the primary server
    Deploy {
        /// Commit to deploy (defaults to HEAD)
        #[arg(long, default_value = "HEAD")]
        commit: String,

        /// Rebuild even when a cached image exists
        #[arg(long)]
        force_rebuild: bool,

        /// Restart the running container without rebuilding
        #[arg(long)]
        restart_only: bool,

        /// Deploy as a pull-request preview with this id
        #[arg(long)]
        pull_request: Option<u64>,

        /// Emit the deployment log as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Verify the primary server is reachable and usable
    Check,
}
