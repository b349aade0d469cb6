// ABOUTME: `kiln worker` command
// ABOUTME: Connects the broker, Docker, run tracker, and reply clients, then runs the worker loop

use anyhow::{Context, Result};
use kiln_queue::{JobQueue, RedisJobQueue};
use kiln_runs::RunReporters;
use kiln_sandbox::{Credentials, DockerSandboxManager, ResourceLimits};
use kiln_sessions::FileSessionRecorder;
use kiln_worker::{Engine, EngineSettings, SlackReplier, SourceReplier, Worker, WorkerConfig};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn run(sweep_stale: bool) -> Result<()> {
    let config = WorkerConfig::from_env()?;

    info!("{}", "=".repeat(60));
    info!("Worker starting");
    info!("Redis: {}:{} (queue: {})", config.redis_host, config.redis_port, config.queue_key);
    info!("Sandbox image: {}", config.sandbox_image);
    info!("Agent timeout: {}s", config.agent_timeout_secs);
    info!("{}", "=".repeat(60));

    let queue = Arc::new(RedisJobQueue::new(
        &config.redis_host,
        config.redis_port,
        &config.queue_key,
    )?);
    queue.ping().await.context("Cannot connect to Redis")?;

    let sandboxes = Arc::new(DockerSandboxManager::new(
        &config.sandbox_image,
        ResourceLimits::default(),
        Credentials::from_env(),
        config.docker_timeout(),
    )?);
    sandboxes.ping().await.context("Cannot connect to Docker")?;

    if sweep_stale {
        if let Err(e) = sandboxes.sweep_stale().await {
            warn!("Failed to sweep stale sandboxes: {}", e);
        }
    }

    let reporters = RunReporters::from_base_url(config.web_run_manager_url.as_deref())?;
    if config.web_run_manager_url.is_none() {
        info!("WEB_RUN_MANAGER_URL not set; jobs using the web run manager will fail");
    }

    let slack = match config.slack_bot_token.as_deref() {
        Some(token) => Some(SlackReplier::new(token)?),
        None => {
            warn!("SLACK_BOT_TOKEN not set; Slack jobs cannot be answered");
            None
        }
    };

    let engine = Engine::new(
        sandboxes,
        reporters,
        Arc::new(FileSessionRecorder::new(config.sessions_dir.clone())),
        Arc::new(SourceReplier::new(slack)),
        EngineSettings {
            agent_timeout_secs: config.agent_timeout_secs,
            gh_owner: config.gh_owner.clone(),
        },
    );
    let worker = Worker::new(queue, engine);

    worker.run(shutdown_signal()).await;

    Ok(())
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, finishing current job"),
        Err(e) => {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await
        }
    }
}
