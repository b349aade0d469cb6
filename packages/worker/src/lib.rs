// ABOUTME: Job execution for Kiln
// ABOUTME: Engine, worker loop, reply delivery, prompt construction, and the CLI producer

pub mod config;
pub mod engine;
pub mod error;
pub mod producer;
pub mod prompt;
pub mod reply;
pub mod worker;

pub use config::{ConfigError, WorkerConfig};
pub use engine::{interpret_output, Engine, EngineSettings, JobOutcome};
pub use error::{EngineError, Result};
pub use producer::{CliProducer, CLI_TRIGGER_USER};
pub use prompt::{build_system_prompt, USER_PROMPT};
pub use reply::{ConsoleReplier, Replier, ReplyError, SlackReplier, SourceReplier};
pub use worker::Worker;
