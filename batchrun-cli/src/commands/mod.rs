//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;
mod pool;
mod run;

pub use job::JobCommands;
pub use pool::PoolCommands;
pub use run::RunArgs;

use anyhow::Result;
use clap::Subcommand;
use std::process::ExitCode;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Provision a pool, run one task per work item and wait for the verdict
    Run(RunArgs),
    /// Pool management
    Pool {
        #[command(subcommand)]
        command: PoolCommands,
    },
    /// Job management
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module. Only `run` can end
/// with a failure exit code without an error: when tasks failed or timed out.
pub async fn handle_command(command: Commands, config: &Config) -> Result<ExitCode> {
    match command {
        Commands::Run(args) => run::handle_run_command(args, config).await,
        Commands::Pool { command } => {
            pool::handle_pool_command(command, config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Job { command } => {
            job::handle_job_command(command, config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
