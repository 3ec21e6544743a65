//! The `check` command: index verification and case-conflict audit

use std::path::Path;

use colored::Colorize;
use skillreg_core::{Layout, RegistryConfig, RegistryStore, find_case_conflicts};
use skillreg_fs::NormalizedPath;

use crate::error::{CliError, Result};

/// Verify the registry and, if given, audit a layout root.
///
/// Fails when the indices disagree or the layout holds names that would
/// collide on a case-insensitive filesystem. Entries without a directory and
/// directories without an entry are reported as warnings.
pub fn run_check(config: &RegistryConfig, registry: &Path, layout: Option<&Path>) -> Result<()> {
    println!("{} Checking registry...", "=>".blue().bold());

    // Loading rebuilds the path index and rejects duplicates
    let store = RegistryStore::load(&NormalizedPath::new(registry))?;
    store.verify()?;
    println!(
        "{} {} entries, path index consistent.",
        "OK".green().bold(),
        store.len()
    );

    let Some(layout) = layout else {
        return Ok(());
    };

    let root = NormalizedPath::new(layout);
    let layout = Layout::new(config);
    let missing = missing_entry_dirs(&layout, &store, &root);
    if !missing.is_empty() {
        println!(
            "{} {} entries have no directory under {}",
            "MISSING".yellow().bold(),
            missing.len(),
            root
        );
        for dir in missing.iter().take(20) {
            println!("   {} {}", "-".yellow(), dir.cyan());
        }
    }

    let unowned = layout.unowned_dirs(&store, &root)?;
    if !unowned.is_empty() {
        println!(
            "{} {} directories under {} belong to no entry",
            "UNOWNED".yellow().bold(),
            unowned.len(),
            root
        );
        for dir in unowned.iter().take(20) {
            println!("   {} {}", "-".yellow(), dir.cyan());
        }
    }

    let conflicts = find_case_conflicts(&root)?;
    if conflicts.is_empty() {
        println!("{} No case conflicts under {}.", "OK".green().bold(), root);
        return Ok(());
    }

    println!("{} Case conflicts found:", "CONFLICT".red().bold());
    for conflict in &conflicts {
        println!(
            "   {} {}: {}",
            "!".red(),
            conflict.parent.dimmed(),
            conflict.names.join(", ")
        );
    }
    Err(CliError::user(format!(
        "{} case conflict(s) under {}",
        conflicts.len(),
        root
    )))
}

fn missing_entry_dirs(layout: &Layout, store: &RegistryStore, root: &NormalizedPath) -> Vec<String> {
    store
        .all()
        .map(|entry| layout.entry_dir(entry))
        .filter(|dir| !root.join(dir).is_dir())
        .collect()
}
