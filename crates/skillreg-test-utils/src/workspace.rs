//! [`TestWorkspace`] fixture for file-based scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use skillreg_core::RawRecord;
use tempfile::TempDir;

/// A temporary directory with conventional locations for the registry
/// snapshot, input sources, layout and publication stores.
///
/// ```rust
/// use skillreg_test_utils::{TestWorkspace, record};
///
/// let ws = TestWorkspace::new();
/// ws.write_records("batch.json", &[record("a/x", "skills/pdf", "PDF")]);
/// ws.assert_file_exists("sources/batch.json");
/// ```
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// `<root>/sources`, the input directory.
    pub fn sources(&self) -> PathBuf {
        self.root().join("sources")
    }

    pub fn registry(&self) -> PathBuf {
        self.root().join("registry.json")
    }

    pub fn layout(&self) -> PathBuf {
        self.root().join("layout")
    }

    pub fn logic_store(&self) -> PathBuf {
        self.root().join("store/logic")
    }

    pub fn archive_store(&self) -> PathBuf {
        self.root().join("store/archive")
    }

    pub fn pin(&self) -> PathBuf {
        self.root().join("pin.json")
    }

    /// Write records as a JSON array into `sources/<name>`.
    pub fn write_records(&self, name: &str, records: &[RawRecord]) -> PathBuf {
        let content = serde_json::to_string_pretty(records).unwrap();
        self.write_source(name, &content)
    }

    /// Write raw text into `sources/<name>`.
    pub fn write_source(&self, name: &str, content: &str) -> PathBuf {
        let path = self.sources().join(name);
        fs::create_dir_all(self.sources()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    /// Write a file relative to the root.
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn read_file(&self, relative: &str) -> String {
        let path = self.root().join(relative);
        fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }

    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, relative: &str) {
        let path = self.root().join(relative);
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }

    pub fn assert_file_not_exists(&self, relative: &str) {
        let path = self.root().join(relative);
        assert!(!path.exists(), "Expected file NOT to exist: {}", path.display());
    }
}
