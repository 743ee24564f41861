//! Pool command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;

use crate::config::Config;

/// Pool subcommands
#[derive(Subcommand)]
pub enum PoolCommands {
    /// Delete a pool and release its nodes
    Delete {
        /// Pool ID
        id: String,
    },
}

/// Handle pool commands
pub async fn handle_pool_command(command: PoolCommands, config: &Config) -> Result<()> {
    let provider = config.provider()?;

    match command {
        PoolCommands::Delete { id } => {
            provider
                .delete_pool(&id)
                .await
                .with_context(|| format!("Failed to delete pool {}", id))?;
            println!("{} Pool {} deleted", "✓".green(), id.cyan());
            Ok(())
        }
    }
}
