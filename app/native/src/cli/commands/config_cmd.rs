//! Config CLI commands.

use clap::Subcommand;

use super::super::output::print_highlighted_json;
use crate::config::{self, config_paths};
use crate::error::CapsuleError;

/// Config inspection commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum ConfigCommands {
    /// Show the configuration file search paths.
    ///
    /// Lists every location searched, in priority order, and marks the file
    /// that is currently in use (if any).
    Path,

    /// Show the effective configuration.
    ///
    /// Prints the configuration after defaults are applied, as JSON.
    Show {
        /// Print plain JSON without colors.
        #[arg(long)]
        raw: bool,
    },
}

/// Execute config subcommands.
///
/// # Errors
///
/// Returns an error if the configuration cannot be serialized.
pub fn execute(cmd: &ConfigCommands) -> Result<(), CapsuleError> {
    match cmd {
        ConfigCommands::Path => {
            show_config_path();
            Ok(())
        }
        ConfigCommands::Show { raw } => show_config(*raw),
    }
}

fn show_config(raw: bool) -> Result<(), CapsuleError> {
    let value = serde_json::to_value(config::get_config())?;
    if raw {
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print_highlighted_json(&value);
    }

    match config::get_config_path() {
        Some(path) => eprintln!("loaded from {}", path.display()),
        None => eprintln!("no configuration file loaded, showing defaults"),
    }
    Ok(())
}

fn show_config_path() {
    println!("Configuration file search paths (in priority order):\n");

    let mut found_config = false;
    for (i, path) in config_paths().iter().enumerate() {
        let exists = path.exists();
        let marker = if exists && !found_config {
            found_config = true;
            " (active)"
        } else if exists {
            " (exists)"
        } else {
            ""
        };

        println!("  {}. {}{}", i + 1, path.display(), marker);
    }

    if !found_config {
        println!("\nNo configuration file found. Defaults are in use.");
        println!("Run 'capsule schema' for the list of options.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_paths_returns_non_empty() {
        assert!(!config_paths().is_empty());
    }
}
