//! Job command handlers
//!
//! Manual inspection and cleanup of jobs left behind by a run.

use anyhow::{Context, Result};
use batchrun_client::BatchProvider;
use batchrun_core::domain::task::TaskState;
use batchrun_core::dto::task::{FieldSelection, TaskSummary};
use clap::Subcommand;
use colored::*;

use crate::config::Config;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// List the tasks of a job with their states
    Tasks {
        /// Job ID
        id: String,

        /// Print the raw task list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Terminate a job; its running tasks are stopped
    Terminate {
        /// Job ID
        id: String,

        /// Reason recorded on the job
        #[arg(long, default_value = "Terminated by operator.")]
        reason: String,
    },
    /// Delete a job and its tasks
    Delete {
        /// Job ID
        id: String,
    },
}

/// Handle job commands
pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let provider = config.provider()?;

    match command {
        JobCommands::Tasks { id, json } => list_tasks(provider.as_ref(), &id, json).await,
        JobCommands::Terminate { id, reason } => {
            provider
                .terminate_job(&id, &reason)
                .await
                .with_context(|| format!("Failed to terminate job {}", id))?;
            println!("{} Job {} terminated", "✓".green(), id.cyan());
            Ok(())
        }
        JobCommands::Delete { id } => {
            provider
                .delete_job(&id)
                .await
                .with_context(|| format!("Failed to delete job {}", id))?;
            println!("{} Job {} deleted", "✓".green(), id.cyan());
            Ok(())
        }
    }
}

/// List the tasks of a job
async fn list_tasks(provider: &dyn BatchProvider, job_id: &str, json: bool) -> Result<()> {
    let tasks = provider
        .list_tasks(job_id, &FieldSelection::id_and_state())
        .await
        .with_context(|| format!("Failed to list tasks of job {}", job_id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }

    if tasks.is_empty() {
        println!("{}", format!("No tasks found in job {}.", job_id).yellow());
    } else {
        println!(
            "{}",
            format!("Found {} task(s) in job {}:", tasks.len(), job_id).bold()
        );
        println!();
        for task in &tasks {
            print_task_summary(task);
        }
    }

    Ok(())
}

fn print_task_summary(task: &TaskSummary) {
    let state = match task.state {
        Some(state) => colorize_state(state),
        None => "unknown".dimmed(),
    };
    println!("  {} {:<12} {}", "▸".cyan(), task.id.to_string(), state);
}

/// Colorize task state for display
fn colorize_state(state: TaskState) -> ColoredString {
    match state {
        TaskState::Active => "Active".yellow(),
        TaskState::Preparing => "Preparing".yellow(),
        TaskState::Running => "Running".blue(),
        TaskState::Completed => "Completed".green(),
    }
}
