//! Bundla - a dependency-aware asset pipeline.
//!
//! Resolves `//= require` / `//= provide` directives across application
//! and library source trees, serves the result in development, and
//! precaches bundles for production.

mod bundle;
mod cli;
mod config;
mod freshness;
mod logger;
mod resolver;
mod state;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{PipelineConfig, init_config};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    state::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = init_config(PipelineConfig::load(&cli)?);

    match &cli.command {
        Commands::Serve { .. } => cli::serve::run(&config),
        Commands::Precache { .. } => cli::precache::run(&config),
        Commands::Check => cli::check::run(&config),
        Commands::Manifest => cli::manifest::run(&config),
    }
}
