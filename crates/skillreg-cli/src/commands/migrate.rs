//! The `migrate` command: explicit assigned-path change

use std::path::Path;

use chrono::Utc;
use colored::Colorize;
use skillreg_core::{CanonicalKey, RegistryStore};
use skillreg_fs::NormalizedPath;

use crate::error::{CliError, Result};

/// Move the entry for `key` to `new_path` and save the registry.
///
/// The key may be given in any form the key normalizer accepts, e.g.
/// `Owner/Repo:skills/pdf/SKILL.md`.
pub fn run_migrate(registry: &Path, key: &str, new_path: &str) -> Result<()> {
    let (repo, path) = key
        .rsplit_once(':')
        .ok_or_else(|| CliError::user(format!("Key must look like <repo>:<path>, got '{}'", key)))?;
    let key = CanonicalKey::from_origin(repo, path);

    let registry = NormalizedPath::new(registry);
    let _lock = super::lock_registry(&registry)?;
    let mut store = RegistryStore::load(&registry)?;
    let old = store.migrate_path(&key, new_path, Utc::now())?;
    store.save(&registry)?;

    println!(
        "{} {}: {} -> {}",
        "OK".green().bold(),
        key,
        old.dimmed(),
        new_path.cyan()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillreg_core::{MergeCoordinator, MergeOptions};
    use skillreg_test_utils::{TestWorkspace, day, record};

    fn seeded(ws: &TestWorkspace) {
        let mut store = RegistryStore::new();
        MergeCoordinator::default()
            .run(
                &mut store,
                &[record("a/x", "skills/pdf", "PDF"), record("b/y", "s", "Docs")],
                &MergeOptions::new(day(1)),
            )
            .unwrap();
        store.save(&NormalizedPath::new(ws.registry())).unwrap();
    }

    #[test]
    fn test_migrate_normalizes_key() {
        let ws = TestWorkspace::new();
        seeded(&ws);

        run_migrate(&ws.registry(), "https://github.com/A/X:skills/pdf/SKILL.md", "pdf-suite").unwrap();

        let store = RegistryStore::load(&NormalizedPath::new(ws.registry())).unwrap();
        assert!(store.lookup_path_owner("pdf-suite").is_some());
        assert!(store.lookup_path_owner("pdf").is_none());
    }

    #[test]
    fn test_migrate_refuses_taken_path() {
        let ws = TestWorkspace::new();
        seeded(&ws);
        assert!(run_migrate(&ws.registry(), "a/x:skills/pdf", "DOCS").is_err());
        assert!(run_migrate(&ws.registry(), "no-separator", "x").is_err());
    }
}
