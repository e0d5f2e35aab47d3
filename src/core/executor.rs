//! Child-process execution for agent iterations.
//!
//! This module runs a program with arguments (no shell in between, so
//! prompts never need quoting) with timeout support, output capture, and
//! kill-on-drop so a cancelled run does not leave the agent behind.

use crate::core::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// How long output keeps draining after the agent process exits.
///
/// Processes the agent started in the background can hold the pipes open
/// indefinitely.
pub const OUTPUT_GRACE: Duration = Duration::from_secs(2);

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program to run, resolved through PATH.
    pub program: String,
    /// Arguments passed verbatim.
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Creates a command spec.
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Output from a command execution.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code of the command.
    pub exit_code: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Whether the command was killed due to timeout.
    pub timed_out: bool,
    /// Duration the command took to run.
    pub duration: Duration,
}

impl CommandOutput {
    /// Returns true if the command succeeded (exit code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }

    /// Returns combined stdout and stderr output.
    #[must_use]
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Working directory for the command.
    pub cwd: Option<PathBuf>,
    /// Limit on how long the process may run.
    pub timeout: Option<Duration>,
}

impl ExecuteOptions {
    /// Sets the working directory.
    #[must_use]
    pub fn cwd(mut self, path: impl AsRef<Path>) -> Self {
        self.cwd = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// Executor for running agent commands.
#[derive(Debug, Default)]
pub struct Executor;

impl Executor {
    /// Creates a new executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Executes a command and captures its output.
    ///
    /// The timeout applies to the process itself. A timeout is reported
    /// through [`CommandOutput::timed_out`], not as an error. Dropping the
    /// returned future kills the child.
    pub async fn execute(&self, command: &CommandSpec, options: ExecuteOptions) -> Result<CommandOutput> {
        let start = std::time::Instant::now();

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref cwd) = options.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::CommandNotFound {
                    command: command.program.clone(),
                }
            } else {
                Error::io(format!("spawn {}", command.program), e)
            }
        })?;

        tracing::debug!(command = %command.program, pid = ?child.id(), "Spawned agent process");

        // Readers stop when this is set or dropped.
        let (stop_tx, stop_rx) = watch::channel(false);
        let stdout = tokio::spawn(read_lines(child.stdout.take(), stop_rx.clone()));
        let stderr = tokio::spawn(read_lines(child.stderr.take(), stop_rx));

        let status = match options.timeout {
            Some(limit) => match timeout(limit, child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    drop(child.kill().await);
                    return Ok(CommandOutput {
                        exit_code: 124,
                        stdout: String::new(),
                        stderr: "Command timed out".to_string(),
                        timed_out: true,
                        duration: start.elapsed(),
                    });
                },
            },
            None => child.wait().await,
        }
        .map_err(|e| Error::io("wait for agent", e))?;

        let (stdout, stderr) = drain_output(stdout, stderr, &stop_tx).await?;

        Ok(CommandOutput {
            exit_code: status.code().unwrap_or(1),
            stdout,
            stderr,
            timed_out: false,
            duration: start.elapsed(),
        })
    }

    /// Checks if a command exists in PATH.
    #[must_use]
    pub fn command_exists(command: &str) -> bool {
        which::which(command).is_ok()
    }
}

/// Collects both readers, stopping them after [`OUTPUT_GRACE`].
async fn drain_output(
    stdout: JoinHandle<String>,
    stderr: JoinHandle<String>,
    stop: &watch::Sender<bool>,
) -> Result<(String, String)> {
    let drained = async { tokio::join!(stdout, stderr) };
    tokio::pin!(drained);

    let finished = tokio::select! {
        output = &mut drained => Some(output),
        () = tokio::time::sleep(OUTPUT_GRACE) => None,
    };

    let (stdout, stderr) = match finished {
        Some(output) => output,
        None => {
            tracing::warn!("Agent output still open after exit, keeping what was read");
            stop.send_replace(true);
            drained.await
        },
    };

    let stdout = stdout.map_err(|e| Error::Internal {
        message: format!("stdout task failed: {e}"),
    })?;
    let stderr = stderr.map_err(|e| Error::Internal {
        message: format!("stderr task failed: {e}"),
    })?;

    Ok((stdout, stderr))
}

/// Reads a child stream line by line until EOF or until told to stop.
async fn read_lines<R>(stream: Option<R>, mut stop: watch::Receiver<bool>) -> String
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut output = String::new();
    let Some(stream) = stream else {
        return output;
    };

    let mut reader = BufReader::new(stream).lines();
    loop {
        tokio::select! {
            line = reader.next_line() => match line {
                Ok(Some(line)) => {
                    output.push_str(&line);
                    output.push('\n');
                },
                _ => break,
            },
            _ = stop.wait_for(|stopped| *stopped) => break,
        }
    }
    output
}
