//! sealpost command-line client

mod args;
mod commands;
mod config;
mod progress;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use args::{Args, Command};
use commands::App;
use config::AppConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "info,sealpost=debug"
    } else {
        "warn,sealpost=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let app = App::new(&config)?;

    match args.command {
        Command::Upload {
            paths,
            resume,
            direct,
        } => app.upload(&paths, resume, direct).await,
        Command::Download { names, direct } => app.download(&names, direct).await,
        Command::Files { outbox, delete } => app.files(outbox, delete.as_deref()).await,
        Command::Resumables { delete } => app.resumables(delete.as_deref()).await,
    }
}
