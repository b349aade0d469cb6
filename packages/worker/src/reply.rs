// ABOUTME: Delivery of a job's terminal message back to whoever requested it
// ABOUTME: Slack thread replies for chat jobs, stdout/stderr for command-line jobs

use async_trait::async_trait;
use kiln_core::{Job, JobSource};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

const SLACK_API_BASE: &str = "https://slack.com/api";
const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Error, Debug)]
pub enum ReplyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Slack API error: {0}")]
    Api(String),

    #[error("No Slack client configured (SLACK_BOT_TOKEN is not set)")]
    SlackNotConfigured,
}

/// Sends the single terminal message of a job.
///
/// Delivery failures are logged by the implementation and never returned.
#[async_trait]
pub trait Replier: Send + Sync {
    async fn reply(&self, job: &Job, text: &str);
    async fn reply_error(&self, job: &Job, text: &str);
}

#[derive(Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    thread_ts: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Minimal Slack Web API client for threaded replies
pub struct SlackReplier {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl SlackReplier {
    pub fn new(token: &str) -> Result<Self, ReplyError> {
        Self::with_base_url(token, SLACK_API_BASE)
    }

    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self, ReplyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `chat.postMessage` into a thread
    pub async fn post_message(
        &self,
        channel: &str,
        thread_ts: &str,
        text: &str,
    ) -> Result<(), ReplyError> {
        let response: PostMessageResponse = self
            .client
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(&self.token)
            .json(&PostMessageRequest {
                channel,
                thread_ts,
                text,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.ok {
            Ok(())
        } else {
            Err(ReplyError::Api(
                response.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}

/// Prints results for jobs submitted from a terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReplier;

impl ConsoleReplier {
    pub fn print(&self, text: &str) {
        println!("{}", text);
    }

    pub fn print_error(&self, text: &str) {
        eprintln!("Error: {}", text);
    }
}

/// Routes each reply by the job's source
pub struct SourceReplier {
    slack: Option<SlackReplier>,
    console: ConsoleReplier,
}

impl SourceReplier {
    pub fn new(slack: Option<SlackReplier>) -> Self {
        Self {
            slack,
            console: ConsoleReplier,
        }
    }

    async fn post_to_thread(&self, job: &Job, text: &str) -> Result<(), ReplyError> {
        let JobSource::Slack {
            channel_id,
            thread_ts,
            ..
        } = &job.source
        else {
            return Ok(());
        };
        let slack = self.slack.as_ref().ok_or(ReplyError::SlackNotConfigured)?;
        slack.post_message(channel_id, thread_ts, text).await
    }
}

#[async_trait]
impl Replier for SourceReplier {
    async fn reply(&self, job: &Job, text: &str) {
        match job.source {
            JobSource::Slack { .. } => match self.post_to_thread(job, text).await {
                Ok(()) => info!("Result posted to Slack"),
                Err(e) => error!("Failed to post result to Slack: {}", e),
            },
            JobSource::Cli {} => self.console.print(text),
        }
    }

    async fn reply_error(&self, job: &Job, text: &str) {
        match job.source {
            JobSource::Slack { .. } => {
                let message = format!("Something went wrong: {}", text);
                match self.post_to_thread(job, &message).await {
                    Ok(()) => info!("Error message posted to Slack"),
                    Err(e) => error!("Failed to post error to Slack: {}", e),
                }
            }
            JobSource::Cli {} => self.console.print_error(text),
        }
    }
}
