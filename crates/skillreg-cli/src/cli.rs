//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Skill registry - deduplicate discovered skills into stable, conflict-free paths
#[derive(Parser, Debug)]
#[command(name = "skillreg")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (TOML, JSON or YAML)
    #[arg(long, global = true, env = "SKILLREG_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Merge a batch of discovered records into the registry
    ///
    /// Examples:
    ///   skillreg run --input sources/ --registry registry.json
    ///   skillreg run --input feed.jsonl --registry registry.json --layout skills/
    Run {
        /// Input file or directory of *.json / *.jsonl files
        #[arg(short, long)]
        input: PathBuf,

        /// Registry snapshot file, created if missing
        #[arg(short, long)]
        registry: PathBuf,

        /// Also write the directory layout under this root
        #[arg(short, long)]
        layout: Option<PathBuf>,

        /// Print the merge report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Publish the registry and its layout as a pinned pair
    Publish {
        /// Registry snapshot file
        #[arg(short, long)]
        registry: PathBuf,

        /// Content store for registry snapshots
        #[arg(long)]
        logic: PathBuf,

        /// Content store for layout manifests
        #[arg(long)]
        archive: PathBuf,

        /// Pin file to advance
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Verify registry indices and audit a layout for case conflicts
    Check {
        /// Registry snapshot file
        #[arg(short, long)]
        registry: PathBuf,

        /// Layout root to audit
        #[arg(short, long)]
        layout: Option<PathBuf>,
    },

    /// Move an entry to a new assigned path
    Migrate {
        /// Registry snapshot file
        #[arg(short, long)]
        registry: PathBuf,

        /// Canonical key of the entry, as `<repo>:<path>`
        #[arg(short, long)]
        key: String,

        /// New assigned path
        #[arg(short, long)]
        path: String,
    },
}
