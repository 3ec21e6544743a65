//! Case-conflict audit of a materialized layout

use std::collections::BTreeMap;

use serde::Serialize;
use skillreg_fs::{NormalizedPath, io};
use tracing::warn;

use crate::Result;

/// Sibling entries whose names differ only in case
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseConflict {
    /// Directory holding the conflicting entries
    pub parent: String,
    pub lowercase: String,
    pub names: Vec<String>,
}

/// Walk `root` and report every set of siblings that would collide on a
/// case-insensitive filesystem.
pub fn find_case_conflicts(root: &NormalizedPath) -> Result<Vec<CaseConflict>> {
    let mut conflicts = Vec::new();
    let mut pending = vec![root.clone()];

    while let Some(dir) = pending.pop() {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for child in io::list_dir(&dir)? {
            let Some(name) = child.file_name() else {
                continue;
            };
            groups
                .entry(name.to_lowercase())
                .or_default()
                .push(name.to_string());
            if child.is_dir() {
                pending.push(child);
            }
        }

        for (lowercase, names) in groups {
            if names.len() > 1 {
                warn!(parent = %dir, %lowercase, count = names.len(), "case conflict");
                conflicts.push(CaseConflict {
                    parent: dir.to_string(),
                    lowercase,
                    names,
                });
            }
        }
    }

    conflicts.sort_by(|a, b| (&a.parent, &a.lowercase).cmp(&(&b.parent, &b.lowercase)));
    Ok(conflicts)
}
