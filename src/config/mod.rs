//! Configuration handling for autocoder.
//!
//! Everything here is optional: with no `autocoder.toml` the launcher runs
//! the `claude` CLI with built-in prompts.

use crate::core::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "autocoder.toml";

/// Model used when neither `--model` nor the config names one.
pub const DEFAULT_MODEL: &str = "claude-opus-4-5-20251101";

/// Spec copied into new projects when `--spec` is not given.
pub const DEFAULT_SPEC_PATH: &str = "prompts/app_spec.txt";

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model used when `--model` is not given.
    pub model: Option<String>,
    /// Spec copied into new projects when `--spec` is not given.
    pub default_spec: Option<PathBuf>,
    /// Agent command settings.
    pub agent: AgentConfig,
}

impl Config {
    /// Loads configuration or returns defaults if not found.
    pub fn load_or_default() -> Result<Self> {
        match Self::find_config_file() {
            Ok(path) => Self::load_from(&path),
            Err(Error::ConfigNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| Error::io("read config", e))?;
        let mut config = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::config_parse_with_source("Failed to parse TOML", e))?;

        config.validate()?;

        Ok(config)
    }

    /// Finds the configuration file by searching up the directory tree.
    pub fn find_config_file() -> Result<PathBuf> {
        let cwd = std::env::current_dir().map_err(|e| Error::io("get current dir", e))?;

        let mut current = cwd.as_path();
        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Ok(config_path);
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Err(Error::ConfigNotFound {
            path: cwd.join(CONFIG_FILE_NAME),
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.agent.command.trim().is_empty() {
            return Err(Error::ConfigInvalid {
                field: "agent.command".to_string(),
                message: "Command cannot be empty".to_string(),
            });
        }

        if humantime::parse_duration(&self.agent.timeout).is_err() {
            return Err(Error::ConfigInvalid {
                field: "agent.timeout".to_string(),
                message: format!("Invalid duration: {}", self.agent.timeout),
            });
        }

        if humantime::parse_duration(&self.agent.delay).is_err() {
            return Err(Error::ConfigInvalid {
                field: "agent.delay".to_string(),
                message: format!("Invalid duration: {}", self.agent.delay),
            });
        }

        if self.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(Error::ConfigInvalid {
                field: "model".to_string(),
                message: "Model cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Resolves the model: explicit flag, then config, then [`DEFAULT_MODEL`].
    #[must_use]
    pub fn resolve_model(&self, flag: Option<&str>) -> String {
        flag.or(self.model.as_deref())
            .unwrap_or(DEFAULT_MODEL)
            .to_string()
    }

    /// Spec copied into new projects when `--spec` is not given.
    #[must_use]
    pub fn default_spec_path(&self) -> PathBuf {
        self.default_spec
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SPEC_PATH))
    }

    /// Anchors relative file paths at `base`, the directory holding the
    /// config file.
    fn resolve_paths(&mut self, base: &Path) {
        let anchor = |path: &mut Option<PathBuf>| {
            if let Some(p) = path.as_mut().filter(|p| p.is_relative()) {
                *p = base.join(&*p);
            }
        };
        anchor(&mut self.default_spec);
        anchor(&mut self.agent.initializer_prompt);
        anchor(&mut self.agent.coding_prompt);
    }
}

/// How each agent iteration is launched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Program to run, resolved through PATH.
    pub command: String,
    /// Argument templates; `{model}` and `{prompt}` are substituted.
    pub args: Vec<String>,
    /// Timeout for a single iteration.
    pub timeout: String,
    /// Pause between iterations.
    pub delay: String,
    /// Text in the agent output that ends the loop early.
    pub completion_signal: Option<String>,
    /// File overriding the built-in first-run prompt.
    pub initializer_prompt: Option<PathBuf>,
    /// File overriding the built-in coding prompt.
    pub coding_prompt: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            args: vec![
                "-p".to_string(),
                "{prompt}".to_string(),
                "--model".to_string(),
                "{model}".to_string(),
                "--output-format".to_string(),
                "json".to_string(),
                "--permission-mode".to_string(),
                "acceptEdits".to_string(),
            ],
            timeout: "2h".to_string(),
            delay: "3s".to_string(),
            completion_signal: None,
            initializer_prompt: None,
            coding_prompt: None,
        }
    }
}

impl AgentConfig {
    /// Per-iteration timeout. Call after [`Config::validate`].
    #[must_use]
    pub fn timeout_duration(&self) -> Duration {
        parse_duration_or(&self.timeout, Duration::from_secs(2 * 60 * 60))
    }

    /// Pause between iterations. Call after [`Config::validate`].
    #[must_use]
    pub fn delay_duration(&self) -> Duration {
        parse_duration_or(&self.delay, Duration::from_secs(3))
    }
}

fn parse_duration_or(value: &str, fallback: Duration) -> Duration {
    humantime::parse_duration(value).unwrap_or_else(|_| {
        tracing::warn!(value = %value, "Invalid duration format, using default");
        fallback
    })
}
