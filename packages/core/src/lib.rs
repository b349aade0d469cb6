// ABOUTME: Core types shared by every Kiln package
// ABOUTME: Job model, normalized agent events, run metadata, and environment constants

pub mod constants;
pub mod event;
pub mod job;
pub mod run;
pub mod utils;

// Re-export main types
pub use event::Event;
pub use job::{Job, JobSource, ModelProvider, ParseEnumError, RunManagerType};
pub use run::RunMetadata;

// Re-export utilities
pub use utils::{generate_cli_label, shell_quote, truncate_chars};
