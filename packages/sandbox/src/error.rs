// ABOUTME: Error types for sandbox operations
// ABOUTME: Docker failures, missing credentials, and exec protocol errors

use thiserror::Error;

/// Main error type for sandbox operations
#[derive(Error, Debug)]
pub enum SandboxError {
    /// Docker/container-related errors
    #[error("Docker error: {0}")]
    Docker(#[from] bollard::errors::Error),

    /// A credential the agent provider needs is not set
    #[error("Missing required credential: {0}")]
    MissingCredential(&'static str),

    /// Base image is not available locally
    #[error("Docker image error: {0}")]
    ImageError(String),

    /// Container failed to be created or started
    #[error("Container failed to start: {0}")]
    ContainerStartFailed(String),

    /// Exec could not be attached to
    #[error("Exec failed: {0}")]
    ExecFailed(String),
}

/// Type alias for Results that return SandboxError
pub type Result<T> = std::result::Result<T, SandboxError>;
