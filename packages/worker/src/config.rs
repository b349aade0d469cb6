// ABOUTME: Worker configuration loaded from environment variables
// ABOUTME: Validates numeric settings and applies defaults for everything optional

use kiln_core::constants::*;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Headroom on top of the agent timeout for Docker API calls
const DOCKER_TIMEOUT_HEADROOM_SECS: u64 = 100;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Everything a worker process reads at startup
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    pub redis_host: String,
    pub redis_port: u16,
    pub queue_key: String,
    pub sandbox_image: String,
    pub agent_timeout_secs: u64,
    pub sessions_dir: PathBuf,
    pub web_run_manager_url: Option<String>,
    pub slack_bot_token: Option<String>,
    pub gh_owner: Option<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            redis_host: DEFAULT_REDIS_HOST.to_string(),
            redis_port: DEFAULT_REDIS_PORT,
            queue_key: DEFAULT_QUEUE_KEY.to_string(),
            sandbox_image: DEFAULT_SANDBOX_IMAGE.to_string(),
            agent_timeout_secs: DEFAULT_AGENT_TIMEOUT_SECS,
            sessions_dir: PathBuf::from(DEFAULT_SESSIONS_DIR),
            web_run_manager_url: None,
            slack_bot_token: None,
            gh_owner: None,
        }
    }
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary lookup. Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let redis_port = match get(REDIS_PORT) {
            Some(v) => parse_number(REDIS_PORT, &v)?,
            None => defaults.redis_port,
        };

        let agent_timeout_secs = match get(KILN_AGENT_TIMEOUT_SECS) {
            Some(v) => {
                let secs: u64 = parse_number(KILN_AGENT_TIMEOUT_SECS, &v)?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        name: KILN_AGENT_TIMEOUT_SECS,
                        value: v,
                        reason: "must be greater than zero".to_string(),
                    });
                }
                secs
            }
            None => defaults.agent_timeout_secs,
        };

        Ok(Self {
            redis_host: get(REDIS_HOST).unwrap_or(defaults.redis_host),
            redis_port,
            queue_key: get(KILN_QUEUE_KEY).unwrap_or(defaults.queue_key),
            sandbox_image: get(KILN_SANDBOX_IMAGE).unwrap_or(defaults.sandbox_image),
            agent_timeout_secs,
            sessions_dir: get(KILN_SESSIONS_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.sessions_dir),
            web_run_manager_url: get(WEB_RUN_MANAGER_URL),
            slack_bot_token: get(SLACK_BOT_TOKEN),
            gh_owner: get(GH_OWNER),
        })
    }

    /// Request timeout for the Docker client; a blocking exec lasts up to the agent timeout
    pub fn docker_timeout(&self) -> Duration {
        Duration::from_secs(self.agent_timeout_secs + DOCKER_TIMEOUT_HEADROOM_SECS)
    }
}

fn parse_number<T>(name: &'static str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
