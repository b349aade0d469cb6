// ABOUTME: No-op run reporter for local testing
// ABOUTME: Hands out random run ids and drops events

use async_trait::async_trait;
use kiln_core::{Event, RunMetadata};
use tracing::info;

use crate::{Result, RunReporter};

pub struct FakeRunReporter;

#[async_trait]
impl RunReporter for FakeRunReporter {
    async fn create_run(&self, metadata: &RunMetadata) -> Result<String> {
        let run_id = uuid::Uuid::new_v4().to_string();
        info!(
            "[FAKE] Created run {} (source={}, user={})",
            run_id, metadata.source, metadata.trigger_user_name
        );
        Ok(run_id)
    }

    async fn send_events(&self, run_id: &str, events: &[Event]) {
        info!(
            "[FAKE] Would send {} events for run {} (skipped)",
            events.len(),
            run_id
        );
    }
}
