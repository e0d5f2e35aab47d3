//! # autocoder
//!
//! Launcher for long-running autonomous coding agents.
//!
//! `autocoder` checks that model credentials are configured, places the
//! project under `generations/`, and hands the run to an agent runner that
//! drives a coding agent one session at a time. Interrupting a run is safe:
//! running the same command again resumes the project.
//!
//! ## Example
//!
//! ```rust,no_run
//! use autocoder::agent::ProcessAgentRunner;
//! use autocoder::core::credentials::ProcessEnv;
//! use autocoder::{Config, InvocationConfig, Launcher};
//! use std::path::PathBuf;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> autocoder::Result<()> {
//!     let launcher = Launcher::new(ProcessEnv);
//!
//!     // Only runs once a credential is present.
//!     let prepare = || -> autocoder::Result<_> {
//!         let config = Config::load_or_default()?;
//!         let runner = ProcessAgentRunner::new(config.agent.clone(), config.default_spec_path());
//!         let invocation = InvocationConfig {
//!             project_dir: PathBuf::from("demo"),
//!             spec_path: None,
//!             max_iterations: Some(3),
//!             model: config.resolve_model(None),
//!         };
//!         Ok((invocation, runner))
//!     };
//!
//!     let interrupt = async {
//!         tokio::signal::ctrl_c().await.ok();
//!     };
//!     launcher
//!         .launch(prepare, interrupt, &mut std::io::stdout())
//!         .await?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod agent;
pub mod cli;
pub mod config;
pub mod core;

// Re-export main types for convenience
pub use agent::AgentRunner;
pub use config::Config;
pub use crate::core::error::{Error, Result};
pub use crate::core::launcher::{InvocationConfig, LaunchOutcome, Launcher};
