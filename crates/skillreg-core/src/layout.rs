//! Directory layout of the registry
//!
//! Every entry lives at `<root>/[<category>/]<assigned_path>/` with its
//! metadata in a single JSON file. Category indexes are written under
//! `<root>/categories/`.
//!
//! The directory each key was last written to is kept in
//! `<root>/.skillreg-layout.json`. When an entry's category or assigned path
//! changes, its old directory is renamed to the new location rather than
//! duplicated.
//!
//! The same layout, reduced to directory + checksum pairs, forms the
//! [`ArchiveManifest`] that gets published next to the registry snapshot.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use skillreg_fs::{NormalizedPath, checksum, io};
use tracing::{debug, info, warn};

use crate::Result;
use crate::config::RegistryConfig;
use crate::identity::{CanonicalKey, NameNormalizer};
use crate::store::{RegistryEntry, RegistryStore};

/// Directory holding the per-category index files
pub const CATEGORIES_DIR: &str = "categories";

const CATEGORY_INDEX_FILE: &str = "index.json";

/// Sidecar recording each key's directory from the previous run
pub const LAYOUT_STATE_FILE: &str = ".skillreg-layout.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct LayoutState {
    dirs: BTreeMap<CanonicalKey, String>,
}

impl LayoutState {
    fn load(root: &NormalizedPath) -> Result<Self> {
        match io::read_text(&root.join(LAYOUT_STATE_FILE)) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.is_not_found() => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, root: &NormalizedPath) -> Result<()> {
        io::write_if_changed(&root.join(LAYOUT_STATE_FILE), &to_pretty_bytes(self)?)?;
        Ok(())
    }
}

/// One entry directory in the archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEntry {
    pub dir: String,
    pub key: CanonicalKey,
    pub metadata_checksum: String,
}

/// Archive snapshot: the directory layout built from one logic snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveManifest {
    /// Content reference of the registry snapshot this layout was built from
    pub logic_ref: String,
    pub entry_count: usize,
    pub entries: Vec<LayoutEntry>,
}

impl ArchiveManifest {
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        to_pretty_bytes(self)
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Counts from writing the layout to disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaterializeReport {
    pub written: usize,
    /// Entry directories renamed to follow a category or path change
    pub moved: usize,
    pub unchanged: usize,
    pub categories: usize,
}

#[derive(Debug, Serialize)]
struct CategorySkill<'a> {
    assigned_path: &'a str,
    dir: String,
    display_name: &'a str,
    description: &'a str,
    stars: u64,
}

#[derive(Debug, Serialize)]
struct CategoryIndex<'a> {
    category: &'a str,
    count: usize,
    skills: Vec<CategorySkill<'a>>,
}

#[derive(Debug, Serialize)]
struct CategorySummary<'a> {
    name: &'a str,
    count: usize,
}

#[derive(Debug, Serialize)]
struct CategoryListing<'a> {
    total: usize,
    categories: Vec<CategorySummary<'a>>,
}

/// Maps registry entries to directories.
#[derive(Debug, Clone)]
pub struct Layout {
    normalizer: NameNormalizer,
    nest_by_category: bool,
    metadata_file: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(&RegistryConfig::default())
    }
}

impl Layout {
    pub fn new(config: &RegistryConfig) -> Self {
        Self {
            normalizer: NameNormalizer::new(&config.naming),
            nest_by_category: config.layout.nest_by_category,
            metadata_file: config.layout.metadata_file.clone(),
        }
    }

    /// Category segment an entry is filed under.
    pub fn category_of(&self, entry: &RegistryEntry) -> String {
        self.normalizer.normalize_category(&entry.metadata.category)
    }

    /// Directory of an entry, relative to the layout root.
    pub fn entry_dir(&self, entry: &RegistryEntry) -> String {
        if self.nest_by_category {
            format!("{}/{}", self.category_of(entry), entry.assigned_path)
        } else {
            entry.assigned_path.clone()
        }
    }

    fn metadata_bytes(entry: &RegistryEntry) -> Result<Vec<u8>> {
        to_pretty_bytes(entry)
    }

    /// Build the archive manifest for a store, sorted by directory.
    pub fn build_manifest(&self, store: &RegistryStore, logic_ref: &str) -> Result<ArchiveManifest> {
        let mut entries = store
            .all()
            .map(|entry| {
                Ok(LayoutEntry {
                    dir: self.entry_dir(entry),
                    key: entry.canonical_key.clone(),
                    metadata_checksum: checksum::compute_bytes_checksum(&Self::metadata_bytes(
                        entry,
                    )?),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        entries.sort_by(|a, b| a.dir.to_lowercase().cmp(&b.dir.to_lowercase()));

        Ok(ArchiveManifest {
            logic_ref: logic_ref.to_string(),
            entry_count: entries.len(),
            entries,
        })
    }

    /// Write every entry's metadata file and the category indexes.
    ///
    /// An entry whose directory changed since the previous run has its old
    /// directory renamed into place first. Files whose content is already
    /// current are left alone, and no directory is ever deleted.
    pub fn materialize(&self, store: &RegistryStore, root: &NormalizedPath) -> Result<MaterializeReport> {
        let mut report = MaterializeReport::default();
        let mut by_category: BTreeMap<String, Vec<&RegistryEntry>> = BTreeMap::new();
        let previous = LayoutState::load(root)?;
        let mut current = LayoutState::default();

        for entry in store.all() {
            let dir = self.entry_dir(entry);
            if let Some(old) = previous.dirs.get(&entry.canonical_key)
                && *old != dir
                && relocate(root, old, &dir)?
            {
                report.moved += 1;
            }

            let path = root.join(&dir).join(&self.metadata_file);
            if io::write_if_changed(&path, &Self::metadata_bytes(entry)?)? {
                report.written += 1;
            } else {
                report.unchanged += 1;
            }
            by_category.entry(self.category_of(entry)).or_default().push(entry);
            current.dirs.insert(entry.canonical_key.clone(), dir);
        }

        report.categories = by_category.len();
        let categories_dir = root.join(CATEGORIES_DIR);
        let mut summaries = Vec::with_capacity(by_category.len());
        for (category, entries) in &mut by_category {
            entries.sort_by(|a, b| {
                b.metadata
                    .stars
                    .cmp(&a.metadata.stars)
                    .then_with(|| a.path_key().cmp(&b.path_key()))
            });
            let index = CategoryIndex {
                category,
                count: entries.len(),
                skills: entries
                    .iter()
                    .map(|e| CategorySkill {
                        assigned_path: &e.assigned_path,
                        dir: self.entry_dir(e),
                        display_name: &e.metadata.display_name,
                        description: &e.metadata.description,
                        stars: e.metadata.stars,
                    })
                    .collect(),
            };
            let path = categories_dir.join(&format!("{}.json", category));
            io::write_if_changed(&path, &to_pretty_bytes(&index)?)?;
            summaries.push(CategorySummary {
                name: category,
                count: entries.len(),
            });
            debug!(%category, count = entries.len(), "category index written");
        }

        let listing = CategoryListing {
            total: store.len(),
            categories: summaries,
        };
        io::write_if_changed(
            &categories_dir.join(CATEGORY_INDEX_FILE),
            &to_pretty_bytes(&listing)?,
        )?;
        current.save(root)?;

        info!(
            root = %root,
            written = report.written,
            moved = report.moved,
            unchanged = report.unchanged,
            categories = report.categories,
            "layout materialized"
        );
        Ok(report)
    }

    /// Entry directories under `root` that no registry entry maps to.
    ///
    /// The category index directory and dot-entries are not entry
    /// directories and are skipped.
    pub fn unowned_dirs(&self, store: &RegistryStore, root: &NormalizedPath) -> Result<Vec<String>> {
        let owned: HashSet<String> = store.all().map(|entry| self.entry_dir(entry)).collect();
        let mut unowned = Vec::new();
        if !root.is_dir() {
            return Ok(unowned);
        }

        for child in io::list_dir(root)? {
            let Some(name) = child.file_name() else {
                continue;
            };
            if !child.is_dir() || name == CATEGORIES_DIR || name.starts_with('.') {
                continue;
            }
            if !self.nest_by_category {
                if !owned.contains(name) {
                    unowned.push(name.to_string());
                }
                continue;
            }
            for inner in io::list_dir(&child)? {
                if let Some(inner_name) = inner.file_name()
                    && inner.is_dir()
                {
                    let dir = format!("{}/{}", name, inner_name);
                    if !owned.contains(&dir) {
                        unowned.push(dir);
                    }
                }
            }
        }
        Ok(unowned)
    }
}

/// Rename an entry directory from `from` to `to`, both relative to `root`.
///
/// Returns `false` when there is nothing to move, or when `to` already
/// exists as a different directory; that case is logged and left alone.
fn relocate(root: &NormalizedPath, from: &str, to: &str) -> Result<bool> {
    let source = root.join(from);
    if !source.is_dir() {
        return Ok(false);
    }
    let target = root.join(to);
    // On case-insensitive filesystems a case-only rename sees itself as the target
    let case_only = from.to_lowercase() == to.to_lowercase();
    let occupied = target.is_dir() && (!case_only || has_exact_name(&target)?);
    if occupied {
        warn!(%from, %to, "target directory already exists, previous directory left in place");
        return Ok(false);
    }
    io::move_dir(&source, &target)?;
    info!(%from, %to, "entry directory moved");
    Ok(true)
}

/// Whether the parent directory lists `path`'s file name with exactly this case.
fn has_exact_name(path: &NormalizedPath) -> Result<bool> {
    let Some(name) = path.file_name() else {
        return Ok(false);
    };
    let parent = path.as_str().rsplit_once('/').map_or(".", |(parent, _)| parent);
    Ok(io::list_dir(&NormalizedPath::new(parent))?
        .iter()
        .any(|child| child.file_name() == Some(name)))
}

fn to_pretty_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}
