// ABOUTME: Entry point for the kiln binary
// ABOUTME: Parses commands, loads .env, installs logging, and reports fatal errors

use clap::{Parser, Subcommand};
use colored::*;
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;

use cli::submit::SubmitArgs;

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Kiln - run coding agents in disposable sandboxes")]
#[command(version)]
struct Cli {
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Consume the job queue and run each job in a fresh sandbox
    Worker {
        /// Remove sandboxes left behind by a previous worker before starting
        #[arg(long)]
        sweep_stale: bool,
    },
    /// Submit a prompt as a job
    Submit(SubmitArgs),
    /// Check that Redis and Docker are reachable
    Ping,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Worker { sweep_stale } => cli::worker::run(sweep_stale).await,
        Commands::Submit(args) => cli::submit::run(args).await,
        Commands::Ping => cli::ping::run().await,
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact())
        .with(filter)
        .init();
}
