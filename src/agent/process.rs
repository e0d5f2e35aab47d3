//! Agent runner that drives an external coding-agent CLI.
//!
//! Each iteration spawns the configured command once inside the project
//! directory and waits for it. The only state this runner keeps on disk is
//! the spec file it seeds into a new project, which is also how it tells a
//! first run from a resumed one.

use crate::agent::prompts::{self, PromptContext, CODING_PROMPT, INITIALIZER_PROMPT};
use crate::agent::AgentRunner;
use crate::config::AgentConfig;
use crate::core::error::{Error, Result};
use crate::core::executor::{CommandOutput, CommandSpec, ExecuteOptions, Executor};
use crate::core::launcher::InvocationConfig;
use async_trait::async_trait;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the spec file inside a project directory.
pub const SEEDED_SPEC_FILE: &str = "app_spec.txt";

/// Longest failure message carried into an error.
const MAX_FAILURE_MESSAGE: usize = 2000;

/// Which prompt a session receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// First session of a freshly seeded project.
    Initializer,
    /// Any later session.
    Coding,
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initializer => write!(f, "initializer"),
            Self::Coding => write!(f, "coding"),
        }
    }
}

/// JSON summary printed by agent CLIs such as `claude --output-format json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgentReply {
    /// Whether the agent reported an error.
    pub is_error: bool,
    /// Final message from the agent.
    pub result: Option<String>,
    /// Number of conversation turns used.
    pub num_turns: Option<u32>,
    /// Reported cost in USD.
    pub total_cost_usd: Option<f64>,
}

impl AgentReply {
    /// Parses stdout as a single JSON object, if it is one.
    #[must_use]
    pub fn parse(stdout: &str) -> Option<Self> {
        serde_json::from_str(stdout.trim()).ok()
    }
}

/// Spinner shown while a session runs. Cleared on drop, so a cancelled
/// session does not leave a stale line behind.
#[derive(Debug)]
struct SessionSpinner(ProgressBar);

impl SessionSpinner {
    fn start(iteration: u32) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg} [{elapsed}]")
                .ok()
                .unwrap_or_else(ProgressStyle::default_spinner),
        );
        pb.set_message(format!("Agent session {iteration} running..."));
        pb.enable_steady_tick(Duration::from_millis(100));
        Self(pb)
    }
}

impl Drop for SessionSpinner {
    fn drop(&mut self) {
        self.0.finish_and_clear();
    }
}

/// Runs the configured agent command once per iteration.
#[derive(Debug, Clone)]
pub struct ProcessAgentRunner {
    config: AgentConfig,
    default_spec: PathBuf,
}

impl ProcessAgentRunner {
    /// Creates a runner from agent settings and the fallback spec path.
    #[must_use]
    pub fn new(config: AgentConfig, default_spec: impl Into<PathBuf>) -> Self {
        Self {
            config,
            default_spec: default_spec.into(),
        }
    }

    /// Runs a single agent session.
    async fn run_iteration(
        &self,
        iteration: u32,
        project_dir: &Path,
        model: &str,
        prompt: &str,
    ) -> Result<CommandOutput> {
        let command = self.command_for(model, prompt);
        tracing::debug!(iteration, command = %command.program, "Starting agent session");

        let options = ExecuteOptions::default()
            .cwd(project_dir)
            .timeout(self.config.timeout_duration());

        let spinner = SessionSpinner::start(iteration);
        let output = Executor::new().execute(&command, options).await;
        drop(spinner);
        let output = output?;

        if output.timed_out {
            return Err(Error::AgentTimeout {
                iteration,
                timeout: self.config.timeout.clone(),
            });
        }

        if !output.success() {
            return Err(Error::agent_failed(
                iteration,
                failure_message(&output),
                Some(output.exit_code),
            ));
        }

        Ok(output)
    }

    /// Builds the command for one session by filling in the argument templates.
    fn command_for(&self, model: &str, prompt: &str) -> CommandSpec {
        CommandSpec::new(
            self.config.command.clone(),
            self.config
                .args
                .iter()
                .map(|arg| arg.replace("{model}", model).replace("{prompt}", prompt)),
        )
    }

    /// Returns true once the configured completion signal shows up.
    fn completion_signalled(&self, output: &CommandOutput) -> bool {
        self.config
            .completion_signal
            .as_deref()
            .filter(|signal| !signal.is_empty())
            .is_some_and(|signal| output.combined_output().contains(signal))
    }
}

#[async_trait]
impl AgentRunner for ProcessAgentRunner {
    async fn run(&self, invocation: &InvocationConfig) -> Result<()> {
        let project_dir = invocation.project_dir.as_path();

        std::fs::create_dir_all(project_dir).map_err(|e| {
            Error::io(format!("create project directory {}", project_dir.display()), e)
        })?;

        let first_run = seed_spec(
            project_dir,
            invocation.spec_path.as_deref(),
            &self.default_spec,
        )?;

        if !Executor::command_exists(&self.config.command) {
            return Err(Error::CommandNotFound {
                command: self.config.command.clone(),
            });
        }

        let initializer = load_prompt(self.config.initializer_prompt.as_deref(), INITIALIZER_PROMPT)?;
        let coding = load_prompt(self.config.coding_prompt.as_deref(), CODING_PROMPT)?;
        let delay = self.config.delay_duration();

        tracing::info!(
            project_dir = %project_dir.display(),
            model = %invocation.model,
            max_iterations = ?invocation.max_iterations,
            first_run,
            "Starting agent loop"
        );

        let mut iteration: u32 = 1;
        while within_bound(iteration, invocation.max_iterations) {
            let kind = if first_run && iteration == 1 {
                SessionKind::Initializer
            } else {
                SessionKind::Coding
            };

            eprintln!(
                "\n{} Session {iteration} ({kind})",
                style("▶").cyan().bold()
            );

            let template = match kind {
                SessionKind::Initializer => &initializer,
                SessionKind::Coding => &coding,
            };
            let prompt = prompts::render(
                template,
                &PromptContext {
                    project_dir,
                    spec_file: SEEDED_SPEC_FILE,
                    model: &invocation.model,
                    iteration,
                },
            );

            let output = self
                .run_iteration(iteration, project_dir, &invocation.model, &prompt)
                .await?;

            if let Some(reply) = AgentReply::parse(&output.stdout) {
                if reply.is_error {
                    return Err(Error::agent_failed(
                        iteration,
                        reply
                            .result
                            .unwrap_or_else(|| "agent reported an error".to_string()),
                        None,
                    ));
                }
                tracing::info!(
                    iteration,
                    num_turns = ?reply.num_turns,
                    cost_usd = ?reply.total_cost_usd,
                    "Agent session summary"
                );
            }

            eprintln!(
                "{} Session {iteration} finished in {}",
                style("✓").green(),
                humantime::format_duration(Duration::from_secs(output.duration.as_secs()))
            );

            if self.completion_signalled(&output) {
                eprintln!("{} Agent signalled completion", style("✓").green());
                break;
            }

            if !within_bound(iteration.saturating_add(1), invocation.max_iterations) {
                tracing::info!(iteration, "Reached max iterations");
                break;
            }

            tracing::debug!(delay = ?delay, "Pausing before next session");
            tokio::time::sleep(delay).await;
            iteration = iteration.saturating_add(1);
        }

        Ok(())
    }
}

/// True while `iteration` has not passed the optional bound.
fn within_bound(iteration: u32, max_iterations: Option<u32>) -> bool {
    max_iterations.map_or(true, |max| iteration <= max)
}

/// Copies the spec into a new project. Returns true on a first run.
///
/// A project counts as new until it contains [`SEEDED_SPEC_FILE`]. An
/// explicit spec must exist; a missing default spec is only a warning.
fn seed_spec(project_dir: &Path, explicit: Option<&Path>, default_spec: &Path) -> Result<bool> {
    let target = project_dir.join(SEEDED_SPEC_FILE);

    if target.exists() {
        if let Some(spec) = explicit {
            tracing::debug!(spec = %spec.display(), "Project already seeded, ignoring --spec");
        }
        return Ok(false);
    }

    let source = match explicit {
        Some(spec) if spec.is_file() => spec,
        Some(spec) => {
            return Err(Error::SpecNotFound {
                path: spec.to_path_buf(),
            })
        },
        None if default_spec.is_file() => default_spec,
        None => {
            tracing::warn!(
                default_spec = %default_spec.display(),
                "Default spec not found, starting without one"
            );
            return Ok(true);
        },
    };

    std::fs::copy(source, &target).map_err(|e| Error::io("copy spec into project", e))?;
    tracing::info!(
        from = %source.display(),
        to = %target.display(),
        "Copied spec into project"
    );

    Ok(true)
}

/// Reads a prompt override, or falls back to the built-in text.
fn load_prompt(path: Option<&Path>, builtin: &str) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("read prompt {}", path.display()), e)),
        None => Ok(builtin.to_string()),
    }
}

/// Picks the most useful text from a failed session.
fn failure_message(output: &CommandOutput) -> String {
    let stderr = output.stderr.trim();
    let text = if stderr.is_empty() {
        output.stdout.trim()
    } else {
        stderr
    };

    if text.is_empty() {
        return format!("agent exited with status {}", output.exit_code);
    }

    match text.char_indices().nth(MAX_FAILURE_MESSAGE) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
