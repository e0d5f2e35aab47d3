//! Main entry point for the `autocoder` CLI.

use autocoder::cli;
use std::error::Error as _;
use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  Caused by: {cause}");
                source = cause.source();
            }
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        },
    }
}
