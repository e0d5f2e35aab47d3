//! CLI command implementations.

use super::Cli;
use crate::agent::ProcessAgentRunner;
use crate::config::Config;
use crate::core::credentials::ProcessEnv;
use crate::core::error::{Error, Result};
use crate::core::launcher::{InvocationConfig, LaunchOutcome, Launcher};
use clap::CommandFactory;
use std::process::ExitCode;

/// Launches the agent for the parsed command line.
///
/// The config file is read inside the launcher's prepare step, after the
/// credential check.
pub fn launch(cli: &Cli) -> Result<ExitCode> {
    let launcher = Launcher::new(ProcessEnv);

    let prepare = || -> Result<(InvocationConfig, ProcessAgentRunner)> {
        let config = match cli.config.as_deref() {
            Some(path) => Config::load_from(path)?,
            None => Config::load_or_default()?,
        };
        let invocation = cli.invocation(&config);
        let runner = ProcessAgentRunner::new(config.agent.clone(), config.default_spec_path());
        Ok((invocation, runner))
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::io("start async runtime", e))?;

    let mut stdout = std::io::stdout();
    let outcome = runtime.block_on(launcher.launch(prepare, interrupt_signal(), &mut stdout))?;

    match outcome {
        LaunchOutcome::Completed => tracing::debug!("Run completed"),
        LaunchOutcome::MissingCredentials => tracing::debug!("Run skipped: no credentials"),
        LaunchOutcome::Interrupted => tracing::debug!("Run interrupted"),
    }

    Ok(ExitCode::SUCCESS)
}

/// Generate shell completions.
pub fn completions(shell: clap_complete::Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupt_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
