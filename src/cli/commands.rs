//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Azure web app sample: provision, deploy, stream, clean up.
#[derive(Parser, Debug)]
#[command(name = "webapp-sample")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the settings file.
    #[arg(short, long, global = true, env = "SAMPLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full sample and clean up afterwards.
    Run {
        /// Short-circuit plain HTTP calls to the playback sentinel.
        #[arg(long)]
        playback: bool,

        /// Azure region for the resource group and web app.
        #[arg(long)]
        region: Option<String>,

        /// Package to deploy.
        #[arg(long)]
        package_url: Option<String>,

        /// Upper bound on the log stream, in seconds.
        #[arg(long)]
        log_timeout: Option<u64>,
    },

    /// Validate the settings.
    Validate,

    /// Fetch a URL through the HTTP helper.
    Probe {
        /// URL to fetch.
        url: String,

        /// Short-circuit to the playback sentinel.
        #[arg(long)]
        playback: bool,
    },

    /// Delete a resource group left behind by an earlier run.
    Cleanup {
        /// Resource group name.
        resource_group: String,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}
