// ABOUTME: Core type definitions for sandboxes
// ABOUTME: Sandbox handle, resource limits, and captured exec output

use serde::{Deserialize, Serialize};

/// Handle to a provisioned sandbox, owned by exactly one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sandbox {
    /// Container ID assigned by Docker
    pub id: String,
    /// Container name (`kiln-sandbox-<suffix>`)
    pub name: String,
}

impl Sandbox {
    /// First 12 characters of the container ID, as Docker prints it
    pub fn short_id(&self) -> &str {
        self.id.get(..12).unwrap_or(&self.id)
    }
}

/// Resource limits applied to every sandbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Memory ceiling in megabytes
    pub memory_mb: u64,
    /// CPU share in cores (1.0 = one full core)
    pub cpu_cores: f64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            memory_mb: 512,
            cpu_cores: 1.0,
        }
    }
}

/// Result of running one command inside a sandbox
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecOutput {
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
