//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for the serve-loadgen binary.

use clap::{Parser, Subcommand};

/// serve-loadgen - Synthetic persona traffic generator
///
/// Drives weighted persona sessions (visitors, power users, app viewers,
/// API clients) against a Serve platform deployment and records which
/// interactions met their success expectations.
#[derive(Parser, Debug)]
#[command(name = "serve-loadgen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a load test plan against the target host
    Run {
        /// Path to configuration file
        #[arg(short, long, env = "SERVE_LOADGEN_CONFIG")]
        config: Option<String>,

        /// Test plan to run (classroom, normal, verify)
        #[arg(short, long)]
        plan: Option<String>,

        /// Number of concurrent virtual users
        #[arg(short, long)]
        users: Option<usize>,

        /// Run duration in seconds
        #[arg(short, long)]
        duration: Option<u64>,

        /// Target base URL (overrides config)
        #[arg(long)]
        base_url: Option<String>,

        /// Allow personas to create server-side objects for this run
        #[arg(long)]
        create_resources: bool,

        /// Write a JSON results summary to this file when the run ends
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Verify the tool setup and target host reachability with a single user
    Verify {
        /// Path to configuration file
        #[arg(short, long, env = "SERVE_LOADGEN_CONFIG")]
        config: Option<String>,

        /// Target base URL (overrides config)
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Display version and build information
    Version,

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the current configuration
    Show {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}
