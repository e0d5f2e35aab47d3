//! Agent runners.
//!
//! The launcher hands a normalized [`InvocationConfig`] to an
//! [`AgentRunner`] and waits. [`ProcessAgentRunner`] is the runner used by
//! the `autocoder` binary.

pub mod process;
pub mod prompts;

use crate::core::error::Result;
use crate::core::launcher::InvocationConfig;
use async_trait::async_trait;

pub use process::ProcessAgentRunner;

/// A long-running routine that performs the autonomous coding iterations.
///
/// Implementations return when their work is done, fail with an error, or
/// return [`Error::Interrupted`](crate::Error::Interrupted) if they observe
/// a cancellation themselves. The launcher may also drop the future at any
/// suspension point when the user interrupts the run.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AgentRunner {
    /// Runs the agent loop for the given invocation.
    async fn run(&self, config: &InvocationConfig) -> Result<()>;
}
