//! Record ingestion from discovery output
//!
//! Input is either a single file or a directory whose `*.json` and `*.jsonl`
//! files are read in sorted order. A JSON file holds an array of records, a
//! single record, or a source document:
//!
//! ```json
//! { "name": "pdf-suite", "repo": "owner/repo", "skills": [ { "name": "PDF" } ] }
//! ```
//!
//! where `repo` is the default origin for skills that do not name their own.
//! A value that does not decode becomes a [`RejectedRecord`] instead of
//! failing the whole batch. I/O failures are still fatal.

use serde_json::Value;
use skillreg_fs::{NormalizedPath, io};
use tracing::{debug, warn};

use crate::Result;
use crate::record::RawRecord;

const JSON_EXT: &str = "json";
const JSONL_EXT: &str = "jsonl";

/// A decoded record and where it came from (`file#index` or `file:line`)
#[derive(Debug, Clone, PartialEq)]
pub struct SourcedRecord {
    pub origin: String,
    pub record: RawRecord,
}

/// An input value that could not be decoded into a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    pub origin: String,
    pub reason: String,
}

/// Everything read from one input location
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestBatch {
    pub records: Vec<SourcedRecord>,
    pub rejected: Vec<RejectedRecord>,
}

impl IngestBatch {
    pub fn len(&self) -> usize {
        self.records.len() + self.rejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.rejected.is_empty()
    }

    fn reject(&mut self, origin: String, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(%origin, %reason, "input rejected");
        self.rejected.push(RejectedRecord { origin, reason });
    }
}

/// Load records from a file or a directory of files.
pub fn load_records(path: &NormalizedPath) -> Result<IngestBatch> {
    let mut batch = IngestBatch::default();

    if path.is_dir() {
        for child in io::list_dir(path)? {
            if child.is_file() && is_input_file(&child) {
                load_file(&child, &mut batch)?;
            }
        }
    } else {
        load_file(path, &mut batch)?;
    }

    debug!(
        path = %path,
        records = batch.records.len(),
        rejected = batch.rejected.len(),
        "input loaded"
    );
    Ok(batch)
}

fn is_input_file(path: &NormalizedPath) -> bool {
    matches!(
        path.extension().map(str::to_ascii_lowercase).as_deref(),
        Some(JSON_EXT | JSONL_EXT)
    )
}

fn load_file(path: &NormalizedPath, batch: &mut IngestBatch) -> Result<()> {
    let content = io::read_text(path)?;
    let name = path.file_name().unwrap_or(path.as_str()).to_string();

    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case(JSONL_EXT)) {
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let origin = format!("{}:{}", name, index + 1);
            match serde_json::from_str::<Value>(line) {
                Ok(value) => push_value(batch, origin, value, None),
                Err(e) => batch.reject(origin, e.to_string()),
            }
        }
        return Ok(());
    }

    let value: Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            batch.reject(name, e.to_string());
            return Ok(());
        }
    };
    push_document(batch, &name, value);
    Ok(())
}

fn push_document(batch: &mut IngestBatch, name: &str, value: Value) {
    match value {
        Value::Array(items) => {
            for (index, item) in items.into_iter().enumerate() {
                push_value(batch, format!("{}#{}", name, index), item, None);
            }
        }
        Value::Object(mut doc) if doc.get("skills").is_some_and(Value::is_array) => {
            let default_repo = doc
                .get("repo")
                .and_then(Value::as_str)
                .map(str::to_string);
            if let Some(Value::Array(skills)) = doc.remove("skills") {
                for (index, item) in skills.into_iter().enumerate() {
                    let origin = format!("{}#{}", name, index);
                    push_value(batch, origin, item, default_repo.as_deref());
                }
            }
        }
        other => push_value(batch, name.to_string(), other, None),
    }
}

fn push_value(batch: &mut IngestBatch, origin: String, value: Value, default_repo: Option<&str>) {
    match serde_json::from_value::<RawRecord>(value) {
        Ok(mut record) => {
            if record.origin_repo.trim().is_empty()
                && let Some(repo) = default_repo
            {
                record.origin_repo = repo.to_string();
            }
            batch.records.push(SourcedRecord { origin, record });
        }
        Err(e) => batch.reject(origin, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> NormalizedPath {
        let path = NormalizedPath::new(dir.path().join(name));
        io::write_text(&path, content).unwrap();
        path
    }

    #[test]
    fn reads_array_file() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "records.json",
            r#"[{"origin_repo": "a/x", "origin_path": "s", "display_name": "S"}]"#,
        );
        let batch = load_records(&path).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].origin, "records.json#0");
        assert_eq!(batch.records[0].record.display_name, "S");
    }

    #[test]
    fn source_document_supplies_default_repo() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "suite.json",
            r#"{"name": "suite", "repo": "Owner/Repo", "skills": [
                {"name": "PDF", "path": "skills/pdf"},
                {"name": "Other", "repo": "c/z", "path": "o"}
            ]}"#,
        );
        let batch = load_records(&path).unwrap();
        let repos: Vec<_> = batch.records.iter().map(|r| r.record.origin_repo.as_str()).collect();
        assert_eq!(repos, vec!["Owner/Repo", "c/z"]);
    }

    #[test]
    fn jsonl_lines_are_numbered_and_bad_lines_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "feed.jsonl",
            "{\"repo\": \"a/x\", \"path\": \"s\"}\n\nnot json\n{\"repo\": \"b/y\", \"path\": \"t\"}\n",
        );
        let batch = load_records(&path).unwrap();
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[1].origin, "feed.jsonl:4");
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].origin, "feed.jsonl:3");
    }

    #[test]
    fn undecodable_values_are_rejected_not_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "mixed.json",
            r#"[{"repo": "a/x", "path": "s"}, 42, {"repo": "b/y", "stars": "many"}]"#,
        );
        let batch = load_records(&path).unwrap();
        assert_eq!(batch.records.len(), 1);
        let origins: Vec<_> = batch.rejected.iter().map(|r| r.origin.as_str()).collect();
        assert_eq!(origins, vec!["mixed.json#1", "mixed.json#2"]);
    }

    #[test]
    fn directory_is_read_in_sorted_order() {
        let dir = TempDir::new().unwrap();
        write(&dir, "b.json", r#"[{"repo": "b/y", "path": "s"}]"#);
        write(&dir, "a.json", r#"[{"repo": "a/x", "path": "s"}]"#);
        write(&dir, "notes.txt", "ignored");
        write(&dir, "broken.json", "{");

        let batch = load_records(&NormalizedPath::new(dir.path())).unwrap();
        let origins: Vec<_> = batch.records.iter().map(|r| r.origin.as_str()).collect();
        assert_eq!(origins, vec!["a.json#0", "b.json#0"]);
        assert_eq!(batch.rejected[0].origin, "broken.json");
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn missing_input_is_fatal() {
        let dir = TempDir::new().unwrap();
        assert!(load_records(&NormalizedPath::new(dir.path().join("missing.json"))).is_err());
    }
}
