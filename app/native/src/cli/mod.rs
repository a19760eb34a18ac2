//! CLI module for Notch Capsule.
//!
//! Inspects the configuration and replays hover scripts against a headless
//! capsule, printing every published panel view.

mod commands;
mod output;

use clap::Parser;
pub use commands::Cli;

use crate::error::CapsuleError;

/// Runs the CLI.
///
/// Parses command-line arguments and executes the appropriate command.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run() -> Result<(), CapsuleError> {
    let cli = Cli::parse();
    cli.execute()
}
