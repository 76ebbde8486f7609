//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Bundla asset pipeline CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: bundla.toml)
    #[arg(short = 'C', long, default_value = "bundla.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the development asset server
    #[command(visible_alias = "s")]
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Write bundles and mirror library assets into the app root
    #[command(visible_alias = "p")]
    Precache {
        /// Pipe bundles through the configured compressor
        #[arg(short, long)]
        compress: bool,
    },

    /// Resolve all dependencies and report problems without writing anything
    #[command(visible_alias = "c")]
    Check,

    /// Print the resolved manifest in load order
    #[command(visible_alias = "m")]
    Manifest,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_args() {
        let cli = Cli::parse_from(["bundla", "serve", "-p", "8080", "-i", "0.0.0.0"]);
        match cli.command {
            Commands::Serve { interface, port } => {
                assert_eq!(port, Some(8080));
                assert_eq!(interface, Some("0.0.0.0".parse().unwrap()));
            }
            _ => panic!("expected serve command"),
        }
    }

    #[test]
    fn test_precache_compress_flag() {
        let cli = Cli::parse_from(["bundla", "precache", "--compress"]);
        match cli.command {
            Commands::Precache { compress } => assert!(compress),
            _ => panic!("expected precache command"),
        }
    }

    #[test]
    fn test_config_default() {
        let cli = Cli::parse_from(["bundla", "check"]);
        assert_eq!(cli.config, PathBuf::from("bundla.toml"));
        assert!(!cli.verbose);
    }
}
