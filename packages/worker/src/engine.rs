// ABOUTME: Job execution engine
// ABOUTME: Drives one job from run lookup through sandbox execution, reporting, reply, and teardown

use futures::FutureExt;
use kiln_agents::{adapter_for, AgentAdapter, AgentResult, NO_OUTPUT_MESSAGE};
use kiln_core::constants::{KILLED_EXIT_CODE, SANDBOX_WORKSPACE};
use kiln_core::{shell_quote, truncate_chars, Event, Job};
use kiln_runs::{RunReporter, RunReporters};
use kiln_sandbox::{ExecOutput, Sandbox, SandboxLease, SandboxManager};
use kiln_sessions::SessionRecorder;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::prompt::{build_system_prompt, full_repo_name, USER_PROMPT};
use crate::{EngineError, Replier, Result};

/// Characters of raw output logged when the stream cannot be interpreted
const RAW_OUTPUT_EXCERPT: usize = 2000;
/// Characters of stderr quoted in a non-zero exit message
const STDERR_EXCERPT: usize = 500;

/// Settings the engine applies to every job
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub agent_timeout_secs: u64,
    pub gh_owner: Option<String>,
}

/// How a job ended. The requester has been answered in both cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The agent ran and its result text was delivered
    Completed { result: String },
    /// The job was aborted and an error reply was delivered
    Failed { error: String },
}

/// Processes jobs one at a time against injected collaborators
pub struct Engine {
    sandboxes: Arc<dyn SandboxManager>,
    reporters: RunReporters,
    sessions: Arc<dyn SessionRecorder>,
    replier: Arc<dyn Replier>,
    settings: EngineSettings,
}

impl Engine {
    pub fn new(
        sandboxes: Arc<dyn SandboxManager>,
        reporters: RunReporters,
        sessions: Arc<dyn SessionRecorder>,
        replier: Arc<dyn Replier>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            sandboxes,
            reporters,
            sessions,
            replier,
            settings,
        }
    }

    /// Run a job to completion. Never fails: every error becomes an error reply.
    pub async fn process_job(&self, job: &Job) -> JobOutcome {
        info!("--- Processing job ---");
        info!(
            "Trigger: {} | Source: {} | Run: {} | Provider: {}",
            job.trigger_user_name,
            job.source_name(),
            job.run_id,
            job.model_provider
        );
        debug!("Thread context:\n{}", job.thread_context);

        let job_start = Instant::now();
        let outcome = self.run_job(job).await;

        let outcome = match outcome {
            Ok(result) => JobOutcome::Completed { result },
            Err(e) => {
                error!("Job failed: {}", e);
                let message = e.to_string();
                self.replier.reply_error(job, &message).await;
                JobOutcome::Failed { error: message }
            }
        };

        info!("Job completed in {:.2}s", job_start.elapsed().as_secs_f64());
        info!("--- Job done ---");
        outcome
    }

    async fn run_job(&self, job: &Job) -> Result<String> {
        // Setup: nothing to clean up if any of this fails
        let reporter = self.reporters.get(job.run_manager_type)?;
        if let Some(repo) = &job.repo {
            if self.settings.gh_owner.is_none() {
                return Err(EngineError::MissingGhOwner(repo.clone()));
            }
        }
        let adapter = adapter_for(job.model_provider, self.settings.agent_timeout_secs);

        let lease =
            SandboxLease::acquire(self.sandboxes.clone(), job.model_provider, &job.run_id).await?;

        let execution = AssertUnwindSafe(self.run_in_sandbox(
            job,
            adapter.as_ref(),
            reporter.as_ref(),
            lease.sandbox(),
        ))
        .catch_unwind()
        .await;

        let result = match execution {
            Ok(Ok(result)) => {
                self.replier.reply(job, &result).await;
                Ok(result)
            }
            Ok(Err(e)) => Err(e),
            Err(panic) => Err(EngineError::Panicked(panic_message(panic.as_ref()))),
        };

        lease.release().await;
        result
    }

    async fn run_in_sandbox(
        &self,
        job: &Job,
        adapter: &dyn AgentAdapter,
        reporter: &dyn RunReporter,
        sandbox: &Sandbox,
    ) -> Result<String> {
        if let Some(repo) = &job.repo {
            self.checkout_repo(sandbox, repo).await?;
        }

        let system_prompt = build_system_prompt(job, self.settings.gh_owner.as_deref());
        adapter
            .write_system_prompt(self.sandboxes.as_ref(), sandbox, &system_prompt)
            .await?;
        adapter.login(self.sandboxes.as_ref(), sandbox).await?;

        let command = adapter.build_command(USER_PROMPT);
        info!(
            "Running {} agent in {}",
            adapter.provider(),
            sandbox.short_id()
        );

        let start = Instant::now();
        let output = self
            .sandboxes
            .exec(sandbox, &command, Some(SANDBOX_WORKSPACE))
            .await?;
        info!(
            "Agent finished | exit_code={} | took {:.2}s",
            output.exit_code,
            start.elapsed().as_secs_f64()
        );
        if !output.stderr.is_empty() {
            warn!("STDERR:\n{}", output.stderr.trim_end());
        }

        let events = adapter.parse_stream(&output.stdout);
        debug!("Parsed {} events", events.len());

        reporter.send_events(&job.run_id, &events).await;
        self.save_session(job, &events).await;

        Ok(interpret_output(
            adapter,
            &output,
            &events,
            self.settings.agent_timeout_secs,
        ))
    }

    async fn checkout_repo(&self, sandbox: &Sandbox, repo: &str) -> Result<()> {
        // Lets `git push` authenticate through gh
        match self.sandboxes.exec(sandbox, "gh auth setup-git", None).await {
            Ok(out) if !out.success() => {
                warn!("gh auth setup-git exited with {}: {}", out.exit_code, out.stderr.trim())
            }
            Ok(_) => {}
            Err(e) => warn!("gh auth setup-git failed: {}", e),
        }

        let full_repo = full_repo_name(self.settings.gh_owner.as_deref(), repo);
        info!("Cloning repo {} into sandbox...", full_repo);
        let clone = format!(
            "gh repo clone {} {} -- --depth=1",
            shell_quote(&full_repo),
            SANDBOX_WORKSPACE
        );
        let output = self.sandboxes.exec(sandbox, &clone, None).await?;

        if !output.success() {
            error!("Failed to clone repo {}: {}", full_repo, output.stderr.trim());
            return Err(EngineError::CloneFailed {
                repo: full_repo,
                detail: output.stderr.trim().to_string(),
            });
        }
        info!("Repo {} cloned successfully", full_repo);
        Ok(())
    }

    async fn save_session(&self, job: &Job, events: &[Event]) {
        let label = job.session_label();
        match self.sessions.save(&label, &job.log_metadata(), events).await {
            Ok(path) => info!("Session log written to {}", path.display()),
            Err(e) => error!("Failed to write session log: {}", e),
        }
    }
}

/// Turn the raw agent run into the text sent back to the requester
pub fn interpret_output(
    adapter: &dyn AgentAdapter,
    output: &ExecOutput,
    events: &[Event],
    timeout_secs: u64,
) -> String {
    if output.exit_code == KILLED_EXIT_CODE {
        warn!("Agent was killed (timeout or OOM)");
        return timeout_message(timeout_secs);
    }

    if events.is_empty() {
        if !output.success() {
            return exit_message(output);
        }
        let raw = output.stdout.trim();
        if !raw.is_empty() {
            error!(
                "Failed to parse agent output as a JSON stream. Raw output:\n{}",
                truncate_chars(raw, RAW_OUTPUT_EXCERPT)
            );
            return raw.to_string();
        }
        return NO_OUTPUT_MESSAGE.to_string();
    }

    match adapter.extract_result(events) {
        AgentResult::NoOutput if !output.success() => exit_message(output),
        result => result.into_text(),
    }
}

fn timeout_message(timeout_secs: u64) -> String {
    if timeout_secs == 60 {
        "Agent timed out after 1 minute.".to_string()
    } else if timeout_secs % 60 == 0 {
        format!("Agent timed out after {} minutes.", timeout_secs / 60)
    } else {
        format!("Agent timed out after {} seconds.", timeout_secs)
    }
}

fn exit_message(output: &ExecOutput) -> String {
    let detail = output.stderr.trim();
    if detail.is_empty() {
        format!("Agent exited with code {}.", output.exit_code)
    } else {
        format!(
            "Agent exited with code {}: {}",
            output.exit_code,
            truncate_chars(detail, STDERR_EXCERPT)
        )
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
