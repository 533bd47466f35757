//! CLI module for the Junos provider tool.
//!
//! This module provides the command-line interface for validating,
//! planning, exporting and simulating resources files.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::{OutputFormatter, ResourceReport};
