//! Error types for autocoder.
//!
//! Every failure the launcher or the default agent runner can report is a
//! variant of [`Error`].

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in autocoder.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // =========================================================================
    // Configuration errors
    // =========================================================================
    /// Configuration file not found.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path where config was expected.
        path: PathBuf,
    },

    /// Failed to parse configuration file.
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        /// Description of the parse error.
        message: String,
        /// Underlying parser error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {field} - {message}")]
    ConfigInvalid {
        /// Field name that is invalid.
        field: String,
        /// Description of why it's invalid.
        message: String,
    },

    // =========================================================================
    // Project setup errors
    // =========================================================================
    /// Spec file given on the command line does not exist.
    #[error("Spec file not found: {path}")]
    SpecNotFound {
        /// Path that was supplied.
        path: PathBuf,
    },

    /// Agent command not found on PATH.
    #[error("Command not found: {command}")]
    CommandNotFound {
        /// The command that wasn't found.
        command: String,
    },

    // =========================================================================
    // Agent errors
    // =========================================================================
    /// An agent iteration exited unsuccessfully.
    #[error("Agent iteration {iteration} failed: {message}")]
    AgentFailed {
        /// 1-based iteration number.
        iteration: u32,
        /// Error message or output.
        message: String,
        /// Exit code if available.
        exit_code: Option<i32>,
    },

    /// An agent iteration ran past its timeout.
    #[error("Agent iteration {iteration} timed out after {timeout}")]
    AgentTimeout {
        /// 1-based iteration number.
        iteration: u32,
        /// Timeout duration as string.
        timeout: String,
    },

    /// The run was cancelled by the user.
    #[error("Interrupted by user")]
    Interrupted,

    // =========================================================================
    // I/O errors
    // =========================================================================
    /// File I/O error.
    #[error("I/O error: {message}")]
    Io {
        /// Description of what failed.
        message: String,
        /// Source error.
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Internal errors
    // =========================================================================
    /// Internal error (should never happen).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Creates a new configuration parse error with source.
    pub fn config_parse_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Creates a new I/O error with context.
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Creates a new agent failure error.
    pub fn agent_failed(iteration: u32, message: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::AgentFailed {
            iteration,
            message: message.into(),
            exit_code,
        }
    }

    /// Returns an exit code appropriate for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AgentFailed { exit_code, .. } => match exit_code {
                Some(code) if *code != 0 => *code,
                _ => 1,
            },
            Self::AgentTimeout { .. } => 124, // Standard timeout exit code
            Self::ConfigNotFound { .. } | Self::ConfigParse { .. } | Self::ConfigInvalid { .. } => {
                78
            }, // EX_CONFIG
            Self::SpecNotFound { .. } => 66, // EX_NOINPUT
            Self::CommandNotFound { .. } => 127,
            Self::Interrupted => 130,
            _ => 1,
        }
    }
}
