//! Batchrun CLI
//!
//! Command-line interface for running batch workflows against a provider
//! account, or against an in-memory simulation with `--simulate`.

mod commands;
mod config;
mod prompt;

use anyhow::Result;
use batchrun_client::Credentials;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "batchrun")]
#[command(about = "Batch job orchestrator CLI", long_about = None)]
struct Cli {
    /// Batch account name
    #[arg(long, env = "BATCH_ACCOUNT_NAME", default_value = "")]
    account_name: String,

    /// Batch account key
    #[arg(long, env = "BATCH_ACCOUNT_KEY", default_value = "", hide_env_values = true)]
    account_key: String,

    /// Batch account URL
    #[arg(long, env = "BATCH_ACCOUNT_URL", default_value = "")]
    account_url: String,

    /// Run against an in-memory simulated provider instead of an account
    #[arg(long, global = true)]
    simulate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "batchrun=info,batchrun_workflow=info,batchrun_client=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        credentials: Credentials::new(cli.account_name, cli.account_key, cli.account_url),
        simulate: cli.simulate,
    };

    handle_command(cli.command, &config).await
}
