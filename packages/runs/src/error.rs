// ABOUTME: Error types for run reporting
// ABOUTME: HTTP failures and missing backend configuration

use kiln_core::RunManagerType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    /// Request failed or returned a non-success status
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Tracker answered with a body that carries no run identifier
    #[error("Invalid run response: {0}")]
    InvalidResponse(String),

    /// The job asked for a backend this process was not configured with
    #[error("Run manager '{0}' is not configured")]
    NotConfigured(RunManagerType),
}

pub type Result<T> = std::result::Result<T, RunError>;
