//! # deploysort CLI Module
//!
//! This module implements the CLI interface for deploysort.
//!
//! ## Available Commands
//!
//! - `sort` - Print the execution order of the manifest's stages
//! - `graph` - Print the label index and the derived ordering edges
//! - `check` - Verify the manifest sorts cleanly

mod commands;

use crate::error::CliError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// deploysort - order deployment stages by capability labels
///
/// Stages that provide a label run before stages that require it; stages
/// that both require and provide it run in between; the terminal stage
/// runs last.
#[derive(Parser, Debug)]
#[command(name = "deploysort")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the stage manifest (TOML, or JSON with a .json extension)
    #[arg(short = 'm', long, global = true, default_value = "deploysort.toml")]
    pub manifest: PathBuf,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the execution order
    Sort {
        /// Show each stage's label roles
        #[arg(short, long)]
        detailed: bool,
    },

    /// Print the label index and derived edges
    Graph,

    /// Verify the manifest sorts without errors
    Check,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), CliError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Sort { detailed }) => cmd_sort(&cli.manifest, json_mode, detailed),
        Some(Commands::Graph) => cmd_graph(&cli.manifest, json_mode),
        Some(Commands::Check) => cmd_check(&cli.manifest, json_mode),
        None => {
            // No subcommand - sort by default
            cmd_sort(&cli.manifest, json_mode, false)
        }
    }
}
