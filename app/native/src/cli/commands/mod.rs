//! CLI command definitions using Clap.
//!
//! - `config_cmd` - Configuration inspection commands
//! - `simulate` - Hover script replay against a headless capsule

use std::io;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};

use crate::error::CapsuleError;
use crate::{config, schema};

pub mod config_cmd;
pub mod simulate;

pub use config_cmd::ConfigCommands;
pub use simulate::SimulateArgs;

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Notch Capsule CLI.
#[derive(Parser, Debug)]
#[command(name = "capsule")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom configuration file.
    ///
    /// Overrides the default configuration file search paths.
    /// Supports JSONC format (JSON with comments).
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum Commands {
    /// Configuration file inspection commands.
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Replay a hover script against a headless capsule.
    ///
    /// Prints every panel view the controller publishes, followed by a
    /// snapshot of the controller once the script has settled.
    Simulate(SimulateArgs),

    /// Output the configuration JSON Schema.
    ///
    /// Can be redirected to a file for editors that support JSON Schema
    /// validation.
    Schema,

    /// Generate shell completions.
    ///
    /// Usage:
    ///   eval "$(capsule completions --shell zsh)"
    ///   capsule completions --shell fish > ~/.config/fish/completions/capsule.fish
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Returns the custom config path if specified via --config flag.
    #[must_use]
    pub fn config_path(&self) -> Option<std::path::PathBuf> {
        self.config.as_ref().map(std::path::PathBuf::from)
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails.
    pub fn execute(&self) -> Result<(), CapsuleError> {
        if let Some(path_buf) = self.config_path() {
            if !path_buf.exists() {
                return Err(CapsuleError::ConfigError(format!(
                    "Configuration file not found: {}",
                    path_buf.display()
                )));
            }
            config::set_custom_config_path(path_buf);
        }

        match &self.command {
            Commands::Config(cmd) => config_cmd::execute(cmd),
            Commands::Simulate(args) => simulate::execute(args),

            Commands::Schema => {
                println!("{}", schema::print_schema());
                Ok(())
            }

            Commands::Completions { shell } => {
                Self::print_completions(*shell);
                Ok(())
            }
        }
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, "capsule", &mut io::stdout());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_schema() {
        let cli = Cli::try_parse_from(["capsule", "schema"]).unwrap();
        assert!(matches!(cli.command, Commands::Schema));
    }

    #[test]
    fn test_cli_parses_completions() {
        let cli = Cli::try_parse_from(["capsule", "completions", "--shell", "zsh"]).unwrap();
        match cli.command {
            Commands::Completions { shell } => assert_eq!(shell, Shell::Zsh),
            _ => panic!("Expected Completions command"),
        }
    }

    #[test]
    fn test_cli_parses_config_show() {
        let cli = Cli::try_parse_from(["capsule", "config", "show", "--raw"]).unwrap();
        assert!(matches!(cli.command, Commands::Config(ConfigCommands::Show { raw: true })));
    }

    #[test]
    fn test_cli_parses_simulate() {
        let cli = Cli::try_parse_from([
            "capsule",
            "simulate",
            "--script",
            "hover.txt",
            "--expand-delay",
            "100",
            "--native",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate(args) => {
                assert_eq!(args.script, Some("hover.txt".into()));
                assert_eq!(args.expand_delay, Some(100));
                assert!(args.collapse_delay.is_none());
                assert!(args.native);
                assert!(!args.native_fails);
                assert_eq!(args.settle, 1000);
            }
            _ => panic!("Expected Simulate command"),
        }
    }

    #[test]
    fn test_native_fails_requires_native() {
        assert!(Cli::try_parse_from(["capsule", "simulate", "--native-fails"]).is_err());
    }

    #[test]
    fn test_cli_parses_config_flag_after_subcommand() {
        let cli =
            Cli::try_parse_from(["capsule", "schema", "--config", "/path/to/config.json"]).unwrap();
        assert_eq!(cli.config, Some("/path/to/config.json".to_string()));
        assert_eq!(cli.config_path(), Some("/path/to/config.json".into()));
    }

    #[test]
    fn test_cli_parses_no_config_flag() {
        let cli = Cli::try_parse_from(["capsule", "schema"]).unwrap();
        assert!(cli.config_path().is_none());
    }

    #[test]
    fn test_cli_definition_is_consistent() { Cli::command().debug_assert(); }
}
