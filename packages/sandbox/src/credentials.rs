// ABOUTME: Agent credential selection for sandbox environments
// ABOUTME: Maps each model provider to the environment variables injected at creation

use kiln_core::constants::{CLAUDE_CODE_OAUTH_TOKEN, GH_TOKEN, OPENAI_API_KEY};
use kiln_core::ModelProvider;
use std::collections::HashMap;

use crate::{Result, SandboxError};

/// Name of the credential variable each provider reads
pub fn credential_var(provider: ModelProvider) -> &'static str {
    match provider {
        ModelProvider::Claude => CLAUDE_CODE_OAUTH_TOKEN,
        ModelProvider::Codex => OPENAI_API_KEY,
    }
}

/// Secrets available to sandboxes, captured from the worker's environment
#[derive(Clone, Default)]
pub struct Credentials {
    values: HashMap<&'static str, String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.values.keys().collect();
        names.sort();
        f.debug_struct("Credentials").field("present", &names).finish()
    }
}

impl Credentials {
    /// Read credentials from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary lookup; empty values count as absent
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let values = [CLAUDE_CODE_OAUTH_TOKEN, OPENAI_API_KEY, GH_TOKEN]
            .into_iter()
            .filter_map(|name| {
                lookup(name)
                    .filter(|v| !v.is_empty())
                    .map(|v| (name, v))
            })
            .collect();
        Self { values }
    }

    /// Environment for a sandbox running `provider`: its credential plus the
    /// optional source-control token.
    pub fn sandbox_env(&self, provider: ModelProvider) -> Result<HashMap<String, String>> {
        let var = credential_var(provider);
        let token = self
            .values
            .get(var)
            .ok_or(SandboxError::MissingCredential(var))?;

        let mut env = HashMap::from([(var.to_string(), token.clone())]);
        if let Some(gh) = self.values.get(GH_TOKEN) {
            env.insert(GH_TOKEN.to_string(), gh.clone());
        }
        Ok(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn creds(pairs: &[(&str, &str)]) -> Credentials {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Credentials::from_lookup(|name| map.get(name).cloned())
    }

    #[rstest]
    #[case(ModelProvider::Claude, CLAUDE_CODE_OAUTH_TOKEN)]
    #[case(ModelProvider::Codex, OPENAI_API_KEY)]
    fn test_sandbox_env_selects_provider_credential(
        #[case] provider: ModelProvider,
        #[case] var: &str,
    ) {
        let credentials = creds(&[
            (CLAUDE_CODE_OAUTH_TOKEN, "claude-secret"),
            (OPENAI_API_KEY, "openai-secret"),
        ]);

        let env = credentials.sandbox_env(provider).unwrap();
        assert_eq!(env.len(), 1);
        assert!(env.contains_key(var));
    }

    #[test]
    fn test_sandbox_env_includes_optional_gh_token() {
        let credentials = creds(&[(CLAUDE_CODE_OAUTH_TOKEN, "c"), (GH_TOKEN, "gh")]);

        let env = credentials.sandbox_env(ModelProvider::Claude).unwrap();
        assert_eq!(env.get(GH_TOKEN).map(String::as_str), Some("gh"));
    }

    #[test]
    fn test_missing_credential_is_an_error() {
        let credentials = creds(&[(CLAUDE_CODE_OAUTH_TOKEN, "c")]);

        let err = credentials.sandbox_env(ModelProvider::Codex).unwrap_err();
        assert!(matches!(err, SandboxError::MissingCredential(OPENAI_API_KEY)));
    }

    #[test]
    fn test_empty_credential_counts_as_missing() {
        let credentials = creds(&[(CLAUDE_CODE_OAUTH_TOKEN, "")]);
        assert!(credentials.sandbox_env(ModelProvider::Claude).is_err());
    }

    #[test]
    fn test_debug_does_not_leak_secrets() {
        let credentials = creds(&[(CLAUDE_CODE_OAUTH_TOKEN, "super-secret")]);
        let printed = format!("{:?}", credentials);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains(CLAUDE_CODE_OAUTH_TOKEN));
    }
}
