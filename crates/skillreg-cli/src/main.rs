//! Skill registry CLI
//!
//! The command-line interface for merging, checking and publishing the
//! skill registry.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Some(cmd) => execute_command(cmd, &config),
        None => {
            println!("{} skill registry CLI", "skillreg".green().bold());
            println!();
            println!("Run {} for available commands.", "skillreg --help".cyan());
            Ok(())
        }
    }
}

/// Log to stderr. `RUST_LOG` wins over the default level.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
    tracing::debug!("Verbose mode enabled");
}

fn execute_command(cmd: Commands, config: &skillreg_core::RegistryConfig) -> Result<()> {
    match cmd {
        Commands::Run {
            input,
            registry,
            layout,
            json,
        } => commands::run_merge(config, &input, &registry, layout.as_deref(), json),
        Commands::Publish {
            registry,
            logic,
            archive,
            output,
        } => commands::run_publish(config, &registry, &logic, &archive, &output),
        Commands::Check { registry, layout } => {
            commands::run_check(config, &registry, layout.as_deref())
        }
        Commands::Migrate {
            registry,
            key,
            path,
        } => commands::run_migrate(&registry, &key, &path),
    }
}
