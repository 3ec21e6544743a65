//! The `publish` command

use std::path::Path;

use chrono::Utc;
use colored::Colorize;
use skillreg_core::{DirContentStore, Layout, Publisher, RegistryConfig, RegistryStore};
use skillreg_fs::NormalizedPath;

use crate::error::Result;

/// Publish the registry snapshot and its layout manifest, then advance the
/// pin at `output`.
pub fn run_publish(
    config: &RegistryConfig,
    registry: &Path,
    logic: &Path,
    archive: &Path,
    output: &Path,
) -> Result<()> {
    let store = RegistryStore::load(&NormalizedPath::new(registry))?;
    println!(
        "{} Publishing {} entries...",
        "=>".blue().bold(),
        store.len()
    );

    let publisher = Publisher::new(
        DirContentStore::new(logic),
        DirContentStore::new(archive),
        NormalizedPath::new(output),
        Layout::new(config),
    );
    let pin = publisher.publish(&store, Utc::now())?;

    println!("   {} {}", "logic".dimmed(), pin.logic);
    println!("   {} {}", "archive".dimmed(), pin.archive);
    println!(
        "{} Pinned generation {} ({} entries).",
        "OK".green().bold(),
        pin.generation,
        pin.entry_count
    );
    Ok(())
}
