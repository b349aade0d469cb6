// ABOUTME: Environment variable name constants and defaults
// ABOUTME: Centralized definitions of every environment variable Kiln reads

// Broker
pub const REDIS_HOST: &str = "REDIS_HOST";
pub const REDIS_PORT: &str = "REDIS_PORT";
pub const KILN_QUEUE_KEY: &str = "KILN_QUEUE_KEY";

// Sandbox
pub const KILN_SANDBOX_IMAGE: &str = "KILN_SANDBOX_IMAGE";
pub const KILN_AGENT_TIMEOUT_SECS: &str = "KILN_AGENT_TIMEOUT_SECS";

// Session logs
pub const KILN_SESSIONS_DIR: &str = "KILN_SESSIONS_DIR";

// Run tracking
pub const WEB_RUN_MANAGER_URL: &str = "WEB_RUN_MANAGER_URL";

// Chat platform
pub const SLACK_BOT_TOKEN: &str = "SLACK_BOT_TOKEN";

// Source control
pub const GH_OWNER: &str = "GH_OWNER";
pub const GH_TOKEN: &str = "GH_TOKEN";

// Agent credentials (one per provider)
pub const CLAUDE_CODE_OAUTH_TOKEN: &str = "CLAUDE_CODE_OAUTH_TOKEN";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

// Defaults
pub const DEFAULT_REDIS_HOST: &str = "localhost";
pub const DEFAULT_REDIS_PORT: u16 = 6379;
pub const DEFAULT_QUEUE_KEY: &str = "jobs";
pub const DEFAULT_SANDBOX_IMAGE: &str = "agent-sandbox:latest";
pub const DEFAULT_AGENT_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_SESSIONS_DIR: &str = "logs/sessions";

/// Workspace directory inside every sandbox
pub const SANDBOX_WORKSPACE: &str = "/workspace";

/// Exit status reported when the agent is killed by SIGKILL (128 + 9)
pub const KILLED_EXIT_CODE: i64 = 137;
