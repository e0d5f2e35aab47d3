//! The launcher: credential gate, project placement, and dispatch.
//!
//! [`Launcher::launch`] checks credentials first, then prepares one
//! [`InvocationConfig`] and its [`AgentRunner`], and maps how that run ends
//! onto a [`LaunchOutcome`] or an [`Error`].

use crate::agent::AgentRunner;
use crate::core::credentials::{missing_credentials_message, Credential, EnvSource, Platform};
use crate::core::error::{Error, Result};
use crate::core::paths::normalize_project_dir;
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;

/// Printed after an interrupted run.
pub const RESUME_HINT: &str = "To resume, run the same command again";

/// Everything the agent runner needs for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationConfig {
    /// Project location.
    pub project_dir: PathBuf,
    /// Spec copied into the project on its first run.
    pub spec_path: Option<PathBuf>,
    /// Upper bound on agent iterations; `None` is unbounded.
    pub max_iterations: Option<u32>,
    /// Model identifier passed through to the agent.
    pub model: String,
}

impl InvocationConfig {
    /// Returns the config with its project directory normalized.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.project_dir = normalize_project_dir(&self.project_dir);
        self
    }
}

/// How a launch ended without error. All of these exit with status 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The agent runner returned normally.
    Completed,
    /// No credential was configured; nothing was prepared or started.
    MissingCredentials,
    /// The user cancelled the run.
    Interrupted,
}

/// Gates a run on credentials and dispatches it to an agent runner.
#[derive(Debug)]
pub struct Launcher<E> {
    env: E,
    platform: Platform,
}

impl<E: EnvSource> Launcher<E> {
    /// Creates a launcher reading credentials from `env`.
    #[must_use]
    pub fn new(env: E) -> Self {
        Self {
            env,
            platform: Platform::current(),
        }
    }

    /// Overrides the platform used for the remediation message.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Runs one invocation.
    ///
    /// `prepare` builds the invocation and its runner. It is only called
    /// once a credential is present, so configuration problems never hide
    /// the remediation message.
    ///
    /// User-facing messages go to `out`. The runner is raced against
    /// `interrupt`; when `interrupt` resolves first the runner future is
    /// dropped. Any runner error other than [`Error::Interrupted`] is
    /// reported and returned unchanged.
    pub async fn launch<P, R, F, W>(&self, prepare: P, interrupt: F, out: &mut W) -> Result<LaunchOutcome>
    where
        P: FnOnce() -> Result<(InvocationConfig, R)>,
        R: AgentRunner,
        F: Future<Output = ()>,
        W: Write,
    {
        let Some(credential) = Credential::detect(&self.env) else {
            tracing::debug!("No credentials configured");
            write!(out, "{}", missing_credentials_message(self.platform))
                .map_err(|e| Error::io("write output", e))?;
            return Ok(LaunchOutcome::MissingCredentials);
        };
        tracing::debug!(credential = %credential, "Using credentials");

        let (config, runner) = prepare()?;
        let config = config.normalized();
        tracing::info!(
            project_dir = %config.project_dir.display(),
            model = %config.model,
            "Launching agent"
        );

        let result = tokio::select! {
            result = runner.run(&config) => result,
            () = interrupt => Err(Error::Interrupted),
        };

        match result {
            Ok(()) => {
                tracing::info!("Agent run completed");
                Ok(LaunchOutcome::Completed)
            },
            Err(Error::Interrupted) => {
                writeln!(out, "\n\nInterrupted by user\n{RESUME_HINT}")
                    .map_err(|e| Error::io("write output", e))?;
                Ok(LaunchOutcome::Interrupted)
            },
            Err(e) => {
                tracing::error!(error = %e, "Agent run failed");
                // The original error wins over a failed write.
                writeln!(out, "\nFatal error: {e}").ok();
                Err(e)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::MockAgentRunner;
    use crate::core::credentials::{API_KEY_VAR, OAUTH_TOKEN_VAR};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::path::Path;

    // =========================================================================
    // Helpers
    // =========================================================================

    fn env_with(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn api_key_env() -> HashMap<String, String> {
        env_with(&[(API_KEY_VAR, "sk-ant-test")])
    }

    fn invocation(project_dir: &str, max_iterations: Option<u32>) -> InvocationConfig {
        InvocationConfig {
            project_dir: PathBuf::from(project_dir),
            spec_path: None,
            max_iterations,
            model: "claude-opus-4-5-20251101".to_string(),
        }
    }

    fn prepared<R>(
        config: InvocationConfig,
        runner: R,
    ) -> impl FnOnce() -> Result<(InvocationConfig, R)> {
        move || Ok((config, runner))
    }

    /// A prepare step that fails the way a broken config file does.
    fn broken_config() -> Result<(InvocationConfig, MockAgentRunner)> {
        Err(Error::ConfigInvalid {
            field: "agent.timeout".to_string(),
            message: "Invalid duration: whenever".to_string(),
        })
    }

    fn never() -> std::future::Pending<()> {
        std::future::pending()
    }

    /// Runner that never finishes on its own.
    struct PendingRunner;

    #[async_trait]
    impl AgentRunner for PendingRunner {
        async fn run(&self, _config: &InvocationConfig) -> Result<()> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    // =========================================================================
    // Credential gate
    // =========================================================================

    #[tokio::test]
    async fn test_missing_credentials_skips_config_and_runner() {
        let launcher = Launcher::new(env_with(&[])).with_platform(Platform::Posix);
        let mut out = Vec::new();

        let outcome = launcher
            .launch(broken_config, never(), &mut out)
            .await
            .expect("launch");

        assert_eq!(outcome, LaunchOutcome::MissingCredentials);
        let out = String::from_utf8(out).expect("utf8");
        assert!(out.contains("No auth configured"));
        assert!(out.contains("export ANTHROPIC_API_KEY="));
    }

    #[tokio::test]
    async fn test_missing_credentials_windows_hint() {
        let mut runner = MockAgentRunner::new();
        runner.expect_run().times(0);
        let launcher = Launcher::new(env_with(&[])).with_platform(Platform::Windows);
        let mut out = Vec::new();

        launcher
            .launch(prepared(invocation("demo", None), runner), never(), &mut out)
            .await
            .expect("launch");

        assert!(String::from_utf8(out).expect("utf8").contains("$env:CLAUDE_CODE_OAUTH_TOKEN="));
    }

    #[tokio::test]
    async fn test_config_error_surfaces_once_credentials_exist() {
        let launcher = Launcher::new(api_key_env());
        let mut out = Vec::new();

        let err = launcher
            .launch(broken_config, never(), &mut out)
            .await
            .expect_err("should fail");

        assert_eq!(err.exit_code(), 78);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_api_key_alone_dispatches() {
        let mut runner = MockAgentRunner::new();
        runner.expect_run().times(1).returning(|_| Ok(()));
        let launcher = Launcher::new(api_key_env());

        let outcome = launcher
            .launch(prepared(invocation("demo", None), runner), never(), &mut Vec::new())
            .await
            .expect("launch");

        assert_eq!(outcome, LaunchOutcome::Completed);
    }

    #[tokio::test]
    async fn test_oauth_token_alone_dispatches() {
        let mut runner = MockAgentRunner::new();
        runner.expect_run().times(1).returning(|_| Ok(()));
        let launcher = Launcher::new(env_with(&[(OAUTH_TOKEN_VAR, "oauth")]));

        let outcome = launcher
            .launch(prepared(invocation("demo", None), runner), never(), &mut Vec::new())
            .await
            .expect("launch");

        assert_eq!(outcome, LaunchOutcome::Completed);
    }

    // =========================================================================
    // What the runner receives
    // =========================================================================

    #[tokio::test]
    async fn test_relative_project_dir_placed_under_generations() {
        let mut runner = MockAgentRunner::new();
        runner
            .expect_run()
            .withf(|config: &InvocationConfig| config.project_dir == Path::new("generations/demo"))
            .times(1)
            .returning(|_| Ok(()));
        let launcher = Launcher::new(api_key_env());

        launcher
            .launch(prepared(invocation("demo", None), runner), never(), &mut Vec::new())
            .await
            .expect("launch");
    }

    #[tokio::test]
    async fn test_prefixed_project_dir_passed_through() {
        let mut runner = MockAgentRunner::new();
        runner
            .expect_run()
            .withf(|config: &InvocationConfig| config.project_dir == Path::new("generations/demo"))
            .times(1)
            .returning(|_| Ok(()));
        let launcher = Launcher::new(api_key_env());

        launcher
            .launch(
                prepared(invocation("generations/demo", None), runner),
                never(),
                &mut Vec::new(),
            )
            .await
            .expect("launch");
    }

    #[tokio::test]
    async fn test_unbounded_iterations_passed_through() {
        let mut runner = MockAgentRunner::new();
        runner
            .expect_run()
            .withf(|config: &InvocationConfig| config.max_iterations.is_none())
            .times(1)
            .returning(|_| Ok(()));
        let launcher = Launcher::new(api_key_env());

        launcher
            .launch(prepared(invocation("demo", None), runner), never(), &mut Vec::new())
            .await
            .expect("launch");
    }

    #[tokio::test]
    async fn test_max_iterations_passed_through() {
        let mut runner = MockAgentRunner::new();
        runner
            .expect_run()
            .withf(|config: &InvocationConfig| {
                config.max_iterations == Some(5)
                    && config.model == "claude-opus-4-5-20251101"
                    && config.spec_path.is_none()
            })
            .times(1)
            .returning(|_| Ok(()));
        let launcher = Launcher::new(api_key_env());

        launcher
            .launch(prepared(invocation("demo", Some(5)), runner), never(), &mut Vec::new())
            .await
            .expect("launch");
    }

    // =========================================================================
    // How the run ends
    // =========================================================================

    #[tokio::test]
    async fn test_runner_interruption_is_clean_exit() {
        let mut runner = MockAgentRunner::new();
        runner
            .expect_run()
            .times(1)
            .returning(|_| Err(Error::Interrupted));
        let launcher = Launcher::new(api_key_env());
        let mut out = Vec::new();

        let outcome = launcher
            .launch(prepared(invocation("demo", None), runner), never(), &mut out)
            .await
            .expect("launch");

        assert_eq!(outcome, LaunchOutcome::Interrupted);
        let out = String::from_utf8(out).expect("utf8");
        assert!(out.contains("Interrupted by user"));
        assert!(out.contains(RESUME_HINT));
    }

    #[tokio::test]
    async fn test_interrupt_signal_cancels_pending_runner() {
        let launcher = Launcher::new(api_key_env());
        let mut out = Vec::new();

        let outcome = launcher
            .launch(
                prepared(invocation("demo", None), PendingRunner),
                std::future::ready(()),
                &mut out,
            )
            .await
            .expect("launch");

        assert_eq!(outcome, LaunchOutcome::Interrupted);
        assert!(String::from_utf8(out).expect("utf8").contains(RESUME_HINT));
    }

    #[tokio::test]
    async fn test_runner_failure_is_returned_unchanged() {
        let mut runner = MockAgentRunner::new();
        runner
            .expect_run()
            .times(1)
            .returning(|_| Err(Error::agent_failed(2, "boom", Some(3))));
        let launcher = Launcher::new(api_key_env());
        let mut out = Vec::new();

        let err = launcher
            .launch(prepared(invocation("demo", None), runner), never(), &mut out)
            .await
            .expect_err("should fail");

        assert!(matches!(
            err,
            Error::AgentFailed {
                iteration: 2,
                exit_code: Some(3),
                ..
            }
        ));
        assert_ne!(err.exit_code(), 0);
        let out = String::from_utf8(out).expect("utf8");
        assert!(out.contains("Fatal error: Agent iteration 2 failed: boom"));
    }

    #[test]
    fn test_invocation_normalized() {
        let config = invocation("./demo", Some(1)).normalized();
        assert_eq!(config.project_dir, PathBuf::from("generations/demo"));
        assert_eq!(config.max_iterations, Some(1));
    }
}
