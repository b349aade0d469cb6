// ABOUTME: `kiln ping` command
// ABOUTME: Reports whether the broker and the Docker daemon are reachable

use anyhow::{bail, Result};
use colored::*;
use kiln_queue::{JobQueue, RedisJobQueue};
use kiln_sandbox::{Credentials, DockerSandboxManager, ResourceLimits};
use kiln_worker::WorkerConfig;

pub async fn run() -> Result<()> {
    let config = WorkerConfig::from_env()?;
    let mut healthy = true;

    let queue = RedisJobQueue::new(&config.redis_host, config.redis_port, &config.queue_key)?;
    match queue.ping().await {
        Ok(()) => {
            let depth = queue.len().await?;
            println!(
                "{} Redis {}:{} ({} queued)",
                "✓".green(),
                config.redis_host,
                config.redis_port,
                depth
            );
        }
        Err(e) => {
            println!("{} Redis {}:{}: {}", "✗".red(), config.redis_host, config.redis_port, e);
            healthy = false;
        }
    }

    let docker = DockerSandboxManager::new(
        &config.sandbox_image,
        ResourceLimits::default(),
        Credentials::default(),
        config.docker_timeout(),
    );
    match docker {
        Ok(docker) => match docker.ping().await {
            Ok(()) => println!("{} Docker", "✓".green()),
            Err(e) => {
                println!("{} Docker: {}", "✗".red(), e);
                healthy = false;
            }
        },
        Err(e) => {
            println!("{} Docker: {}", "✗".red(), e);
            healthy = false;
        }
    }

    if !healthy {
        bail!("One or more services are unreachable");
    }
    Ok(())
}
