//! CLI module for the web app sample.
//!
//! This module provides the command-line interface for running the sample
//! and its maintenance commands.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
