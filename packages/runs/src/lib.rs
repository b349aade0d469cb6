// ABOUTME: Run reporting for Kiln
// ABOUTME: Creates tracked runs before enqueue and streams events to them afterward

pub mod error;
pub mod fake;
pub mod web;

pub use error::{Result, RunError};
pub use fake::FakeRunReporter;
pub use web::WebRunReporter;

use async_trait::async_trait;
use kiln_core::{Event, RunManagerType, RunMetadata};
use std::sync::Arc;

/// Backend that tracks a job's lifecycle as a "run"
#[async_trait]
pub trait RunReporter: Send + Sync {
    /// Register a run and return its opaque identifier. Must succeed before a job is enqueued.
    async fn create_run(&self, metadata: &RunMetadata) -> Result<String>;

    /// Send events for a run, one call per event.
    ///
    /// Best effort: a failed event is logged and the rest are still sent.
    async fn send_events(&self, run_id: &str, events: &[Event]);
}

/// The reporters a process can route to, selected per job by [`RunManagerType`]
#[derive(Clone)]
pub struct RunReporters {
    fake: Arc<dyn RunReporter>,
    web: Option<Arc<dyn RunReporter>>,
}

impl RunReporters {
    pub fn new(fake: Arc<dyn RunReporter>, web: Option<Arc<dyn RunReporter>>) -> Self {
        Self { fake, web }
    }

    /// Reporters built from an optional tracker base URL
    pub fn from_base_url(base_url: Option<&str>) -> Result<Self> {
        let web = match base_url {
            Some(url) => Some(Arc::new(WebRunReporter::new(url)?) as Arc<dyn RunReporter>),
            None => None,
        };
        Ok(Self::new(Arc::new(FakeRunReporter), web))
    }

    /// Reporter for the given backend selector
    pub fn get(&self, kind: RunManagerType) -> Result<Arc<dyn RunReporter>> {
        match kind {
            RunManagerType::Fake => Ok(self.fake.clone()),
            RunManagerType::Web => self.web.clone().ok_or(RunError::NotConfigured(kind)),
        }
    }
}
