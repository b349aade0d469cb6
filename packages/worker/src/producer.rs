// ABOUTME: Command-line job producer
// ABOUTME: Registers a run and enqueues a single job built from a prompt

use kiln_core::{Job, JobSource, ModelProvider, RunManagerType, RunMetadata};
use kiln_queue::{JobQueue, Result};
use kiln_runs::RunReporter;
use std::sync::Arc;
use tracing::{error, info};

/// Requester name recorded for command-line jobs
pub const CLI_TRIGGER_USER: &str = "cli-user";

pub struct CliProducer {
    queue: Arc<dyn JobQueue>,
    reporter: Arc<dyn RunReporter>,
    run_manager_type: RunManagerType,
    model_provider: ModelProvider,
}

impl CliProducer {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        reporter: Arc<dyn RunReporter>,
        run_manager_type: RunManagerType,
        model_provider: ModelProvider,
    ) -> Self {
        Self {
            queue,
            reporter,
            run_manager_type,
            model_provider,
        }
    }

    /// Create a run for `prompt` and enqueue the job.
    ///
    /// Returns `Ok(None)` when the run could not be created; nothing is
    /// enqueued in that case. Broker failures are returned as errors.
    pub async fn submit(&self, prompt: &str, repo: Option<&str>) -> Result<Option<Job>> {
        info!("Starting CLI producer");
        self.queue.ping().await?;

        let metadata = RunMetadata::cli(CLI_TRIGGER_USER, prompt, repo);
        let run_id = match self.reporter.create_run(&metadata).await {
            Ok(id) => id,
            Err(e) => {
                error!("Failed to create run, not enqueuing job: {}", e);
                return Ok(None);
            }
        };

        let job = Job {
            thread_context: prompt.to_string(),
            trigger_user_name: CLI_TRIGGER_USER.to_string(),
            repo: repo.map(str::to_string),
            run_id,
            run_manager_type: self.run_manager_type,
            model_provider: self.model_provider,
            source: JobSource::Cli {},
        };
        let depth = self.queue.enqueue(&job).await?;
        info!("CLI job enqueued | run: {} | queue depth: {}", job.run_id, depth);
        Ok(Some(job))
    }
}
