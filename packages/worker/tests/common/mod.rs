// ABOUTME: In-memory fakes for engine scenario tests
// ABOUTME: Scripted sandbox, recording run reporter, session recorder, and replier

#![allow(dead_code)]

use async_trait::async_trait;
use kiln_core::{Event, Job, JobSource, ModelProvider, RunManagerType, RunMetadata};
use kiln_runs::{RunReporter, RunReporters};
use kiln_sandbox::{ExecOutput, Sandbox, SandboxError, SandboxManager};
use kiln_sessions::SessionRecorder;
use kiln_worker::{Engine, EngineSettings, Replier};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub const SANDBOX_ID: &str = "0123456789abcdef";

/// What the fake sandbox does when a command matches
#[derive(Clone)]
pub enum Step {
    Respond(ExecOutput),
    Panic(&'static str),
    /// Notify, keep running for a moment, then respond
    Signal(Arc<Notify>, ExecOutput),
}

pub fn ok(stdout: &str) -> Step {
    Step::Respond(ExecOutput {
        exit_code: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
    })
}

pub fn exit(code: i64, stdout: &str, stderr: &str) -> Step {
    Step::Respond(ExecOutput {
        exit_code: code,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    })
}

#[derive(Default)]
pub struct FakeSandboxes {
    script: Vec<(&'static str, Step)>,
    fail_provision: bool,
    pub provisioned: Mutex<Vec<(ModelProvider, String)>>,
    pub commands: Mutex<Vec<(String, Option<String>)>>,
    pub destroyed: Mutex<Vec<String>>,
}

impl FakeSandboxes {
    /// Commands containing `needle` get `step`; everything else succeeds silently
    pub fn on(mut self, needle: &'static str, step: Step) -> Self {
        self.script.push((needle, step));
        self
    }

    pub fn failing_provision() -> Self {
        Self {
            fail_provision: true,
            ..Default::default()
        }
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .map(|(c, _)| c.clone())
            .collect()
    }

    pub fn ran(&self, needle: &str) -> bool {
        self.command_lines().iter().any(|c| c.contains(needle))
    }

    pub fn destroy_count(&self) -> usize {
        self.destroyed.lock().unwrap().len()
    }
}

#[async_trait]
impl SandboxManager for FakeSandboxes {
    async fn provision(
        &self,
        provider: ModelProvider,
        run_id: &str,
    ) -> kiln_sandbox::Result<Sandbox> {
        if self.fail_provision {
            return Err(SandboxError::ContainerStartFailed(
                "image agent-sandbox:latest failed to start".to_string(),
            ));
        }
        self.provisioned
            .lock()
            .unwrap()
            .push((provider, run_id.to_string()));
        Ok(Sandbox {
            id: SANDBOX_ID.to_string(),
            name: "kiln-sandbox-test".to_string(),
        })
    }

    async fn exec(
        &self,
        _sandbox: &Sandbox,
        command: &str,
        workdir: Option<&str>,
    ) -> kiln_sandbox::Result<ExecOutput> {
        self.commands
            .lock()
            .unwrap()
            .push((command.to_string(), workdir.map(str::to_string)));

        let step = self
            .script
            .iter()
            .find(|(needle, _)| command.contains(needle))
            .map(|(_, step)| step.clone());

        match step {
            Some(Step::Respond(output)) => Ok(output),
            Some(Step::Panic(msg)) => panic!("{}", msg),
            Some(Step::Signal(started, output)) => {
                started.notify_one();
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(output)
            }
            None => Ok(ExecOutput::default()),
        }
    }

    async fn destroy(&self, sandbox: &Sandbox) {
        self.destroyed.lock().unwrap().push(sandbox.id.clone());
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    pub sent: Mutex<Vec<(String, Vec<Event>)>>,
}

impl RecordingReporter {
    pub fn all_events(&self) -> Vec<Event> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(_, events)| events.clone())
            .collect()
    }
}

#[async_trait]
impl RunReporter for RecordingReporter {
    async fn create_run(&self, _metadata: &RunMetadata) -> kiln_runs::Result<String> {
        Ok("unused".to_string())
    }

    async fn send_events(&self, run_id: &str, events: &[Event]) {
        if !events.is_empty() {
            self.sent
                .lock()
                .unwrap()
                .push((run_id.to_string(), events.to_vec()));
        }
    }
}

#[derive(Default)]
pub struct RecordingSessions {
    pub saved: Mutex<Vec<(String, Value, Vec<Event>)>>,
}

#[async_trait]
impl SessionRecorder for RecordingSessions {
    async fn save(
        &self,
        label: &str,
        metadata: &Value,
        events: &[Event],
    ) -> kiln_sessions::Result<PathBuf> {
        self.saved
            .lock()
            .unwrap()
            .push((label.to_string(), metadata.clone(), events.to_vec()));
        Ok(PathBuf::from(format!("logs/sessions/{}.jsonl", label)))
    }
}

#[derive(Default)]
pub struct RecordingReplier {
    pub replies: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl RecordingReplier {
    pub fn replies(&self) -> Vec<String> {
        self.replies.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    /// Total terminal messages delivered
    pub fn delivered(&self) -> usize {
        self.replies().len() + self.errors().len()
    }
}

#[async_trait]
impl Replier for RecordingReplier {
    async fn reply(&self, _job: &Job, text: &str) {
        self.replies.lock().unwrap().push(text.to_string());
    }

    async fn reply_error(&self, _job: &Job, text: &str) {
        self.errors.lock().unwrap().push(text.to_string());
    }
}

pub struct Harness {
    pub engine: Engine,
    pub sandboxes: Arc<FakeSandboxes>,
    pub reporter: Arc<RecordingReporter>,
    pub sessions: Arc<RecordingSessions>,
    pub replier: Arc<RecordingReplier>,
}

pub fn harness(sandboxes: FakeSandboxes) -> Harness {
    harness_with_owner(sandboxes, Some("owner"))
}

pub fn harness_with_owner(sandboxes: FakeSandboxes, gh_owner: Option<&str>) -> Harness {
    let sandboxes = Arc::new(sandboxes);
    let reporter = Arc::new(RecordingReporter::default());
    let sessions = Arc::new(RecordingSessions::default());
    let replier = Arc::new(RecordingReplier::default());

    let engine = Engine::new(
        sandboxes.clone(),
        RunReporters::new(reporter.clone(), None),
        sessions.clone(),
        replier.clone(),
        EngineSettings {
            agent_timeout_secs: 600,
            gh_owner: gh_owner.map(str::to_string),
        },
    );

    Harness {
        engine,
        sandboxes,
        reporter,
        sessions,
        replier,
    }
}

pub fn cli_job(provider: ModelProvider, repo: Option<&str>) -> Job {
    Job {
        thread_context: "add a test".to_string(),
        trigger_user_name: "cli-user".to_string(),
        repo: repo.map(str::to_string),
        run_id: "r1".to_string(),
        run_manager_type: RunManagerType::Fake,
        model_provider: provider,
        source: JobSource::Cli {},
    }
}

pub fn slack_job() -> Job {
    Job {
        source: JobSource::Slack {
            channel_id: "C1".to_string(),
            thread_ts: "1700000000.000100".to_string(),
            trigger_user: "U1".to_string(),
        },
        trigger_user_name: "ana".to_string(),
        ..cli_job(ModelProvider::Claude, None)
    }
}
