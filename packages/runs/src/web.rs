// ABOUTME: HTTP-backed run reporter
// ABOUTME: POST {base}/runs to create, POST {base}/runs/{id}/run_entries per event

use async_trait::async_trait;
use kiln_core::{Event, RunMetadata};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

use crate::{Result, RunError, RunReporter};

/// Per-request timeout for tracker calls
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Serialize)]
struct CreateRunRequest<'a> {
    run: RunPayload<'a>,
}

#[derive(Serialize)]
struct RunPayload<'a> {
    creator: &'a str,
    source: &'a str,
    thread_context: &'a str,
    repo: Option<&'a str>,
    channel_id: Option<&'a str>,
    thread_ts: Option<&'a str>,
}

#[derive(Serialize)]
struct RunEntryRequest<'a> {
    run_entry: RunEntryPayload<'a>,
}

#[derive(Serialize)]
struct RunEntryPayload<'a> {
    data: &'a Event,
}

pub struct WebRunReporter {
    client: reqwest::Client,
    base_url: String,
}

impl WebRunReporter {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_event(&self, url: &str, event: &Event) -> Result<()> {
        let body = RunEntryRequest {
            run_entry: RunEntryPayload { data: event },
        };
        self.client
            .post(url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Pull the run identifier out of the tracker's response body.
///
/// The tracker answers with the bare id; objects carrying `id` or `run_id` are
/// accepted as well.
fn run_id_from_response(body: Value) -> Result<String> {
    fn scalar(value: &Value) -> Option<String> {
        match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    let run_id = match &body {
        Value::Object(map) => map.get("run_id").or_else(|| map.get("id")).and_then(scalar),
        other => scalar(other),
    };
    run_id.ok_or_else(|| RunError::InvalidResponse(body.to_string()))
}

#[async_trait]
impl RunReporter for WebRunReporter {
    async fn create_run(&self, metadata: &RunMetadata) -> Result<String> {
        let url = format!("{}/runs", self.base_url);
        let body = CreateRunRequest {
            run: RunPayload {
                creator: &metadata.trigger_user_name,
                source: &metadata.source,
                thread_context: &metadata.thread_context,
                repo: metadata.repo.as_deref(),
                channel_id: metadata.channel_id.as_deref(),
                thread_ts: metadata.thread_ts.as_deref(),
            },
        };

        info!("Creating run at {}", url);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let run_id = run_id_from_response(response.json::<Value>().await?)?;
        info!("Run created: {}", run_id);
        Ok(run_id)
    }

    async fn send_events(&self, run_id: &str, events: &[Event]) {
        let url = format!("{}/runs/{}/run_entries", self.base_url, run_id);
        info!("Sending {} events for run {}", events.len(), run_id);

        let mut failed = 0;
        for event in events {
            if let Err(e) = self.post_event(&url, event).await {
                error!("Failed to send event for run {}: {}", run_id, e);
                failed += 1;
            }
        }

        info!(
            "Events sent for run {} ({} ok, {} failed)",
            run_id,
            events.len() - failed,
            failed
        );
    }
}
