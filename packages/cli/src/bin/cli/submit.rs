// ABOUTME: `kiln submit` command
// ABOUTME: Creates a run for a command-line prompt and enqueues the job

use anyhow::{bail, Result};
use clap::Args;
use colored::*;
use kiln_core::{ModelProvider, RunManagerType};
use kiln_queue::RedisJobQueue;
use kiln_runs::RunReporters;
use kiln_worker::{CliProducer, WorkerConfig};
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Task for the agent
    #[arg(short, long)]
    pub prompt: String,

    /// Repository (under GH_OWNER) to clone into the sandbox
    #[arg(long)]
    pub repo: Option<String>,

    /// Agent to run: claude or codex
    #[arg(long, default_value = "claude")]
    pub provider: ModelProvider,

    /// Run tracker: fake or web
    #[arg(long, default_value = "fake")]
    pub run_manager: RunManagerType,
}

pub async fn run(args: SubmitArgs) -> Result<()> {
    let config = WorkerConfig::from_env()?;

    let queue = Arc::new(RedisJobQueue::new(
        &config.redis_host,
        config.redis_port,
        &config.queue_key,
    )?);
    let reporter = RunReporters::from_base_url(config.web_run_manager_url.as_deref())?
        .get(args.run_manager)?;

    let producer = CliProducer::new(queue, reporter, args.run_manager, args.provider);
    match producer.submit(&args.prompt, args.repo.as_deref()).await? {
        Some(job) => {
            println!(
                "{} Job enqueued (run {}, provider {})",
                "✓".green(),
                job.run_id.bold(),
                job.model_provider
            );
            Ok(())
        }
        None => bail!("Run could not be created; job was not enqueued"),
    }
}
