//! The `run` command: merge a batch into the registry

use std::path::Path;

use chrono::Utc;
use colored::Colorize;
use skillreg_core::{
    DiffKind, Layout, MergeCoordinator, MergeOptions, RegistryConfig, RegistryStore, load_records,
};
use skillreg_fs::NormalizedPath;

use crate::error::Result;

/// Run a merge batch and save the registry.
///
/// Skipped records are reported but do not fail the command.
pub fn run_merge(
    config: &RegistryConfig,
    input: &Path,
    registry: &Path,
    layout: Option<&Path>,
    json: bool,
) -> Result<()> {
    let registry = NormalizedPath::new(registry);
    let _lock = super::lock_registry(&registry)?;
    let mut store = RegistryStore::load_or_empty(&registry)?;
    let batch = load_records(&NormalizedPath::new(input))?;

    if !json {
        println!(
            "{} Merging {} records into {} existing entries...",
            "=>".blue().bold(),
            batch.len(),
            store.len()
        );
    }

    let options = MergeOptions::from_config(&config.merge, Utc::now());
    let report = MergeCoordinator::new(config).run_batch(&mut store, &batch, &options)?;
    store.save(&registry)?;

    let materialized = match layout {
        Some(root) => Some(Layout::new(config).materialize(&store, &NormalizedPath::new(root))?),
        None => None,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for entry in &report.entries {
        match entry.kind {
            DiffKind::Created => println!(
                "   {} {}",
                "+".green(),
                entry.assigned_path.as_deref().unwrap_or_default().cyan()
            ),
            DiffKind::Updated => println!(
                "   {} {}",
                "~".yellow(),
                entry.assigned_path.as_deref().unwrap_or_default().cyan()
            ),
            DiffKind::Skipped => println!(
                "   {} {}: {}",
                "!".red(),
                entry.origin.as_deref().unwrap_or_default().dimmed(),
                entry.reason.as_deref().unwrap_or_default()
            ),
            DiffKind::Unchanged => {}
        }
    }

    let counts = report.counts;
    println!(
        "{} {} created, {} updated, {} unchanged, {} skipped ({} entries)",
        "OK".green().bold(),
        counts.created,
        counts.updated,
        counts.unchanged,
        counts.skipped,
        store.len()
    );
    if let Some(layout) = materialized {
        println!(
            "{} Layout: {} written, {} moved, {} unchanged, {} categories",
            "OK".green().bold(),
            layout.written,
            layout.moved,
            layout.unchanged,
            layout.categories
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillreg_test_utils::{TestWorkspace, record};

    #[test]
    fn test_run_merge_creates_registry_and_layout() {
        let ws = TestWorkspace::new();
        ws.write_records(
            "batch.json",
            &[record("a/x", "s", "PDF Tools"), record("b/y", "s", "PDF Tools")],
        );

        run_merge(
            &RegistryConfig::default(),
            &ws.sources(),
            &ws.registry(),
            Some(ws.layout().as_path()),
            false,
        )
        .unwrap();

        let store = RegistryStore::load(&NormalizedPath::new(ws.registry())).unwrap();
        assert_eq!(store.len(), 2);
        ws.assert_file_exists("layout/other/pdf-tools-b-y/metadata.json");
    }

    #[test]
    fn test_run_merge_missing_input_fails() {
        let ws = TestWorkspace::new();
        let result = run_merge(
            &RegistryConfig::default(),
            &ws.root().join("missing"),
            &ws.registry(),
            None,
            true,
        );
        assert!(result.is_err());
        ws.assert_file_not_exists("registry.json");
    }
}
