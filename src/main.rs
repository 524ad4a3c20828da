//! serve-loadgen - Synthetic persona traffic generator
//!
//! Main entry point: parses the CLI, loads configuration, initializes
//! logging, and hands a test plan to the runner.

use std::fs;

use clap::Parser;
use tracing::info;

use serve_loadgen::cli::{Cli, Commands, ConfigSubcommand};
use serve_loadgen::config::{self, LoadConfig};
use serve_loadgen::error::{Error, Result};
use serve_loadgen::logging::{self, LogGuards};
use serve_loadgen::plan::Plan;
use serve_loadgen::runner::Runner;
use serve_loadgen::version;

fn main() -> Result<()> {
    // Parse CLI arguments first (before logging, so we know verbosity)
    let cli = Cli::parse();

    // Commands that don't need full logging use a minimal setup
    match &cli.command {
        Commands::Version => {
            version::print_version();
            return Ok(());
        }
        Commands::Config { subcommand } => {
            logging::init_simple(tracing::Level::WARN)?;
            return handle_config_command(subcommand.clone());
        }
        _ => {}
    }

    // Load configuration and apply CLI overrides
    let (config, output) = match &cli.command {
        Commands::Run {
            config: config_path,
            plan,
            users,
            duration,
            base_url,
            create_resources,
            output,
        } => {
            let mut config = load_or_exit(config_path.as_deref());
            if let Some(plan) = plan {
                config.run.plan = plan.clone();
            }
            if let Some(users) = users {
                config.run.users = *users;
            }
            if let Some(duration) = duration {
                config.run.duration_secs = *duration;
            }
            if let Some(base_url) = base_url {
                config.target.base_url = base_url.clone();
            }
            if *create_resources {
                config.features.create_resources = true;
            }
            (config, output.clone())
        }
        Commands::Verify {
            config: config_path,
            base_url,
        } => {
            let mut config = load_or_exit(config_path.as_deref());
            if let Some(base_url) = base_url {
                config.target.base_url = base_url.clone();
            }
            // A verify run is one visitor for a few seconds
            config.run.plan = "verify".to_string();
            config.run.users = 1;
            config.run.duration_secs = 10;
            (config, None)
        }
        Commands::Version | Commands::Config { .. } => unreachable!(),
    };

    if let Err(e) = config.validate() {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }

    // The guards must be kept alive for the lifetime of the program
    let _log_guards: LogGuards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;

    let build = version::build_info();
    info!(
        version = %build.full_version(),
        target = %build.target,
        profile = %build.profile,
        "Starting serve-loadgen"
    );

    let plan: Plan = config
        .run
        .plan
        .parse()
        .map_err(Error::Config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create runtime: {}", e)))?;

    let runner = Runner::new(config, plan);
    let result = runtime.block_on(runner.run());

    // Write the JSON results summary regardless of how the run ended
    if let Some(path) = output {
        let summary = runner.summary();
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| Error::Internal(format!("Failed to serialize summary: {}", e)))?;
        fs::write(&path, json)?;
        info!(path = %path, "results summary written");
    }

    result
}

/// Load configuration or exit with a formatted error
fn load_or_exit(config_path: Option<&str>) -> LoadConfig {
    match LoadConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprint!("{}", e.format_for_terminal());
            std::process::exit(e.exit_code());
        }
    }
}

/// Handle config management subcommands
fn handle_config_command(subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show { config } => {
            let loaded = LoadConfig::load(config.as_deref())?;
            let rendered = toml::to_string_pretty(&loaded)?;
            println!("{}", rendered);
            Ok(())
        }
        ConfigSubcommand::Init { path, force } => config::init_config(path.as_deref(), force),
        ConfigSubcommand::Validate { config } => {
            let loaded = LoadConfig::load(config.as_deref())?;
            loaded.validate()?;
            println!("Configuration is valid");
            Ok(())
        }
    }
}
