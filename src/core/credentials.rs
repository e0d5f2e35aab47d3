//! Credential detection for the model-invocation service.
//!
//! Either an API key or an OAuth token authorizes a run. Lookups go
//! through [`EnvSource`] so callers can supply a fixed environment.

use std::collections::HashMap;
use std::env;

/// Environment variable holding an Anthropic API key.
pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// Environment variable holding a Claude Code OAuth token.
pub const OAUTH_TOKEN_VAR: &str = "CLAUDE_CODE_OAUTH_TOKEN";

/// Source of environment variables.
pub trait EnvSource {
    /// Returns the value of `key`, if set.
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<T: EnvSource + ?Sized> EnvSource for &T {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}

/// Which credential authorized the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    /// `ANTHROPIC_API_KEY` is set.
    ApiKey,
    /// `CLAUDE_CODE_OAUTH_TOKEN` is set.
    OAuthToken,
}

impl Credential {
    /// Name of the environment variable backing this credential.
    #[must_use]
    pub const fn var_name(&self) -> &'static str {
        match self {
            Self::ApiKey => API_KEY_VAR,
            Self::OAuthToken => OAUTH_TOKEN_VAR,
        }
    }

    /// Detects a credential, preferring the API key when both are set.
    ///
    /// Empty values are treated as unset.
    pub fn detect(env: &impl EnvSource) -> Option<Self> {
        let present = |key: &str| env.var(key).is_some_and(|v| !v.is_empty());

        if present(API_KEY_VAR) {
            Some(Self::ApiKey)
        } else if present(OAUTH_TOKEN_VAR) {
            Some(Self::OAuthToken)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.var_name())
    }
}

/// Shell family used for the remediation example.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// PowerShell on Windows.
    Windows,
    /// POSIX shells.
    Posix,
}

impl Platform {
    /// Platform of the running process.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }
}

/// Builds the message printed when no credential is configured.
#[must_use]
pub fn missing_credentials_message(platform: Platform) -> String {
    let set_example = match platform {
        Platform::Windows => format!(
            "  $env:{API_KEY_VAR}=\"your-api-key-here\"\n  # OR\n  $env:{OAUTH_TOKEN_VAR}=\"your-oauth-token-here\""
        ),
        Platform::Posix => format!(
            "  export {API_KEY_VAR}='your-api-key-here'\n  # OR\n  export {OAUTH_TOKEN_VAR}='your-oauth-token-here'"
        ),
    };

    format!(
        "Error: No auth configured.\n  \
         - {API_KEY_VAR} is not set\n  \
         - {OAUTH_TOKEN_VAR} is not set\n\
         \n\
         Configure one of the following:\n  \
         - API key: https://console.anthropic.com/\n  \
         - OAuth token (Claude Code): run `claude setup-token`\n\
         \n\
         Then set it (examples):\n\
         {set_example}\n"
    )
}
