// ABOUTME: Job payload carried on the queue from producers to the worker
// ABOUTME: Common base record plus a closed set of producer-specific variants

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::utils::generate_cli_label;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

/// Agent implementation that runs inside the sandbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    /// Claude Code CLI
    #[default]
    Claude,
    /// OpenAI Codex CLI
    Codex,
}

impl ModelProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelProvider::Claude => "claude",
            ModelProvider::Codex => "codex",
        }
    }
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelProvider {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "claude" => Ok(ModelProvider::Claude),
            "codex" => Ok(ModelProvider::Codex),
            _ => Err(ParseEnumError {
                kind: "model provider",
                value: s.to_string(),
            }),
        }
    }
}

/// Backend that tracks runs for a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunManagerType {
    /// HTTP run tracker
    Web,
    /// No-op tracker for local testing
    #[default]
    Fake,
}

impl RunManagerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunManagerType::Web => "web",
            RunManagerType::Fake => "fake",
        }
    }
}

impl fmt::Display for RunManagerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunManagerType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "web" => Ok(RunManagerType::Web),
            "fake" => Ok(RunManagerType::Fake),
            _ => Err(ParseEnumError {
                kind: "run manager type",
                value: s.to_string(),
            }),
        }
    }
}

/// Producer-specific part of a job.
///
/// On the wire these fields sit next to the common ones in one flat object.
/// A job carrying `channel_id` and `thread_ts` is a Slack job, one carrying
/// neither is a CLI job, and one carrying only one of them is rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JobSource {
    /// Triggered by a mention in a Slack thread
    Slack {
        channel_id: String,
        thread_ts: String,
        trigger_user: String,
    },
    /// Submitted from the command line
    Cli {},
}

impl<'de> Deserialize<'de> for JobSource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct SourceFields {
            #[serde(default)]
            channel_id: Option<String>,
            #[serde(default)]
            thread_ts: Option<String>,
            #[serde(default)]
            trigger_user: Option<String>,
        }

        let fields = SourceFields::deserialize(deserializer)?;
        match (fields.channel_id, fields.thread_ts) {
            (Some(channel_id), Some(thread_ts)) => Ok(JobSource::Slack {
                channel_id,
                thread_ts,
                trigger_user: fields.trigger_user.unwrap_or_default(),
            }),
            (None, None) => Ok(JobSource::Cli {}),
            (Some(_), None) => Err(de::Error::custom("Slack job is missing thread_ts")),
            (None, Some(_)) => Err(de::Error::custom("Slack job is missing channel_id")),
        }
    }
}

/// Unit of work handed from a producer to the worker. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub thread_context: String,
    pub trigger_user_name: String,
    #[serde(default)]
    pub repo: Option<String>,
    pub run_id: String,
    #[serde(default)]
    pub run_manager_type: RunManagerType,
    #[serde(default)]
    pub model_provider: ModelProvider,
    #[serde(flatten)]
    pub source: JobSource,
}

impl Job {
    /// Short name of the producer that created this job
    pub fn source_name(&self) -> &'static str {
        match self.source {
            JobSource::Slack { .. } => "slack",
            JobSource::Cli {} => "cli",
        }
    }

    /// Context section for the system prompt, framed for the job's source
    pub fn context_block(&self) -> String {
        match self.source {
            JobSource::Slack { .. } => {
                let context = if self.thread_context.is_empty() {
                    "(no context)"
                } else {
                    self.thread_context.as_str()
                };
                format!(
                    "## Slack thread context\n\
                     The following messages are from the Slack thread that triggered this task:\n\n\
                     {}",
                    context
                )
            }
            JobSource::Cli {} => format!(
                "## CLI prompt\n\
                 The following prompt was provided via the command line:\n\n\
                 {}",
                self.thread_context
            ),
        }
    }

    /// Metadata header written at the top of the session log
    pub fn log_metadata(&self) -> Value {
        match &self.source {
            JobSource::Slack {
                channel_id,
                thread_ts,
                ..
            } => json!({
                "source": "slack",
                "thread_ts": thread_ts,
                "channel_id": channel_id,
                "trigger_user_name": self.trigger_user_name,
                "repo": self.repo,
                "run_id": self.run_id,
                "model_provider": self.model_provider,
            }),
            JobSource::Cli {} => json!({
                "source": "cli",
                "trigger_user_name": self.trigger_user_name,
                "repo": self.repo,
                "run_id": self.run_id,
                "model_provider": self.model_provider,
            }),
        }
    }

    /// Label used to name the session log file
    pub fn session_label(&self) -> String {
        match &self.source {
            JobSource::Slack { thread_ts, .. } => thread_ts.clone(),
            JobSource::Cli {} => generate_cli_label(),
        }
    }
}
