//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Junos provider - declarative configuration for Junos devices.
#[derive(Parser, Debug)]
#[command(name = "junos-provider")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the resources file.
    #[arg(short, long, global = true, env = "JUNOS_PROVIDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the resources file.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// Show the configuration lines each resource renders to.
    Plan {
        /// Plan full replacements instead of creations.
        #[arg(short, long)]
        update: bool,
    },

    /// Write the configuration lines to a set file without a device.
    Export {
        /// Set file to append to (defaults to `provider.fake_create_set_file`).
        #[arg(short, long)]
        set_file: Option<PathBuf>,

        /// Export updates instead of creations.
        #[arg(short, long)]
        update: bool,
    },

    /// Apply every resource to an in-memory device and check it for drift.
    Simulate {
        /// Platform model of the simulated device.
        #[arg(short, long)]
        model: Option<String>,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}
