//! Command-line interface definitions for Genba Press.
//!
//! This module defines the CLI arguments and subcommands using the `clap`
//! crate. One binary drives every stage of the pipeline: the daily digest,
//! the weekly article generator, the index rebuilder, and the API server.

use clap::{Parser, Subcommand};

/// Command-line arguments for the Genba Press application.
///
/// # Examples
///
/// ```sh
/// # Generate today's digest (skips if already generated today)
/// genba_press digest
///
/// # Generate one weekly how-to article from the queued themes
/// genba_press weekly
///
/// # Rebuild the posts index page from the posts directory
/// genba_press build-index
///
/// # Run the HTTP API
/// genba_press serve
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Pipeline stages, each runnable on its own schedule.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch news, summarize in Japanese, and write the daily digest file
    Digest {
        /// Regenerate even if today's digest already exists
        #[arg(long)]
        force: bool,
    },
    /// Pop one queued theme and generate a how-to article (draft + final pass)
    Weekly,
    /// Rebuild the posts index page from the posts directory
    BuildIndex,
    /// Serve the JSON API
    Serve,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_digest_force() {
        let cli = Cli::parse_from(["genba_press", "digest", "--force"]);
        match cli.command {
            Command::Digest { force } => assert!(force),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parses_config_path() {
        let cli = Cli::parse_from(["genba_press", "-c", "/etc/genba/config.yaml", "serve"]);
        assert_eq!(cli.config.as_deref(), Some("/etc/genba/config.yaml"));
        assert!(matches!(cli.command, Command::Serve));
    }

    #[test]
    fn test_cli_parses_build_index() {
        let cli = Cli::parse_from(["genba_press", "build-index"]);
        assert!(matches!(cli.command, Command::BuildIndex));
    }
}
