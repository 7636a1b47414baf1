//! CLI module for the gateway console
//!
//! Provides subcommands:
//! - `serve`: run the HTTP server (default)
//! - `check-config`: load and validate configuration, then exit

pub mod check_config;
pub mod serve;

use clap::{Parser, Subcommand};

/// Gateway Console - accounts, projects, API keys and usage for an AI gateway
#[derive(Parser)]
#[command(name = "gateway-console")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Validate configuration and print the effective settings
    CheckConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_no_subcommand() {
        let cli = Cli::try_parse_from(["gateway-console"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parses_check_config() {
        let cli = Cli::try_parse_from(["gateway-console", "check-config"]).unwrap();
        assert!(matches!(cli.command, Some(Command::CheckConfig)));
    }
}
