//! Command-line interface for autocoder.
//!
//! `autocoder` has no subcommands: every invocation launches (or resumes)
//! one autonomous coding run.

mod commands;

use crate::config::{Config, DEFAULT_MODEL};
use crate::core::error::Result;
use crate::core::launcher::InvocationConfig;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Project directory used when `--project-dir` is not given.
pub const DEFAULT_PROJECT_DIR: &str = "./autonomous_demo_project";

/// Autonomous coding agent - long-running agent harness.
#[derive(Debug, Parser)]
#[command(
    name = "autocoder",
    author,
    version,
    about = "Autonomous coding agent - long-running agent harness",
    long_about = r#"
autocoder runs a coding agent against a project directory, one session at a
time, until the iteration limit is reached or you stop it with Ctrl-C.

The first session of a new project copies the spec into the project and
sets it up; later sessions continue from whatever the project contains.
Re-running the same command resumes the project.
"#,
    after_help = r#"Examples:
  # Start fresh project
  autocoder --project-dir ./claude_clone

  # Start fresh project with a custom spec
  autocoder --project-dir ./claude_clone --spec ./specs/my_mvp_spec.txt

  # Use a specific model
  autocoder --project-dir ./claude_clone --model claude-sonnet-4-5-20250929

  # Limit iterations for testing
  autocoder --project-dir ./claude_clone --max-iterations 5

Environment variables:
  ANTHROPIC_API_KEY         Anthropic API key
  CLAUDE_CODE_OAUTH_TOKEN   OAuth token from `claude setup-token`
  (one of the two is required; a .env file is loaded if present)
"#
)]
pub struct Cli {
    /// Directory for the project. Relative paths are placed under generations/.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_PROJECT_DIR)]
    pub project_dir: PathBuf,

    /// Spec copied into the project on first run [default: prompts/app_spec.txt].
    #[arg(long, value_name = "FILE")]
    pub spec: Option<PathBuf>,

    /// Maximum number of agent iterations [default: unlimited].
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_iterations: Option<u32>,

    /// Model to use.
    #[arg(long, value_name = "MODEL", help = format!("Claude model to use [default: {DEFAULT_MODEL}]"))]
    pub model: Option<String>,

    /// Configuration file [default: autocoder.toml, searched upwards].
    #[arg(long, value_name = "FILE", env = "AUTOCODER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Use color output.
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,

    /// Print shell completions and exit.
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<clap_complete::Shell>,
}

impl Cli {
    /// Builds the invocation for the agent runner.
    ///
    /// The project directory is left as given; the launcher normalizes it.
    #[must_use]
    pub fn invocation(&self, config: &Config) -> InvocationConfig {
        InvocationConfig {
            project_dir: self.project_dir.clone(),
            spec_path: self.spec.clone(),
            max_iterations: self.max_iterations,
            model: config.resolve_model(self.model.as_deref()),
        }
    }
}

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Always use color.
    Always,
    /// Auto-detect color support.
    #[default]
    Auto,
    /// Never use color.
    Never,
}

/// Runs the CLI.
pub fn run() -> Result<ExitCode> {
    // Loaded before parsing so AUTOCODER_CONFIG can come from .env too.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);
    setup_color(cli.color);

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => {},
        Err(e) => tracing::warn!(error = %e, "Failed to load .env"),
    }

    if let Some(shell) = cli.completions {
        commands::completions(shell);
        return Ok(ExitCode::SUCCESS);
    }

    commands::launch(&cli)
}

/// Sets up logging based on verbosity flags.
fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Sets up color output.
fn setup_color(choice: ColorChoice) {
    match choice {
        ColorChoice::Always => {
            console::set_colors_enabled(true);
            console::set_colors_enabled_stderr(true);
        },
        ColorChoice::Never => {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        },
        ColorChoice::Auto => {
            // Let console crate auto-detect
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_cli_parsing_help() {
        let cli = Cli::try_parse_from(["autocoder", "--help"]);
        // --help causes early exit, so this will be an error
        assert!(cli.is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    // =========================================================================
    // Defaults
    // =========================================================================

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["autocoder"]).expect("parse");
        assert_eq!(cli.project_dir, PathBuf::from(DEFAULT_PROJECT_DIR));
        assert_eq!(cli.spec, None);
        assert_eq!(cli.max_iterations, None);
        assert_eq!(cli.model, None);
        assert!(!cli.verbose);
        assert!(!cli.quiet);
        assert_eq!(cli.color, ColorChoice::Auto);
        assert!(cli.completions.is_none());
    }

    #[test]
    fn test_default_invocation() {
        let cli = Cli::try_parse_from(["autocoder"]).expect("parse");
        let invocation = cli.invocation(&Config::default());

        assert_eq!(invocation.model, DEFAULT_MODEL);
        assert_eq!(invocation.max_iterations, None);
        assert_eq!(
            invocation.normalized().project_dir,
            PathBuf::from("generations/autonomous_demo_project")
        );
    }

    // =========================================================================
    // Flags
    // =========================================================================

    #[test]
    fn test_parse_all_flags() {
        let cli = Cli::try_parse_from([
            "autocoder",
            "--project-dir",
            "demo",
            "--spec",
            "specs/mvp.txt",
            "--max-iterations",
            "5",
            "--model",
            "claude-sonnet-4-5-20250929",
        ])
        .expect("parse");

        let invocation = cli.invocation(&Config::default());
        assert_eq!(
            invocation,
            InvocationConfig {
                project_dir: PathBuf::from("demo"),
                spec_path: Some(PathBuf::from("specs/mvp.txt")),
                max_iterations: Some(5),
                model: "claude-sonnet-4-5-20250929".to_string(),
            }
        );
    }

    #[test]
    fn test_config_model_used_without_flag() {
        let cli = Cli::try_parse_from(["autocoder"]).expect("parse");
        let config = Config {
            model: Some("claude-haiku".to_string()),
            ..Config::default()
        };
        assert_eq!(cli.invocation(&config).model, "claude-haiku");
    }

    #[rstest]
    #[case("0")]
    #[case("-1")]
    #[case("five")]
    #[case("1.5")]
    fn test_invalid_max_iterations_rejected(#[case] value: &str) {
        let result = Cli::try_parse_from(["autocoder", "--max-iterations", value]);
        assert!(result.is_err(), "{value} should be rejected");
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(Cli::try_parse_from(["autocoder", "--bogus"]).is_err());
    }

    #[test]
    fn test_parse_verbose_and_color() {
        let cli = Cli::try_parse_from(["autocoder", "-v", "--color", "never"]).expect("parse");
        assert!(cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn test_parse_completions() {
        let cli = Cli::try_parse_from(["autocoder", "--completions", "bash"]).expect("parse");
        assert_eq!(cli.completions, Some(clap_complete::Shell::Bash));
    }

    #[test]
    fn test_color_choice_default() {
        assert_eq!(ColorChoice::default(), ColorChoice::Auto);
    }
}
