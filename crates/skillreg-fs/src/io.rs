//! Locked, atomic file I/O
//!
//! Every durable artifact (registry snapshot, pin file, layout metadata)
//! goes through [`write_atomic`], so readers see either the old or the new
//! file and never a prefix of it.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use fs2::FileExt;
use tracing::debug;

use crate::{Error, NormalizedPath, Result};

/// Distinguishes temp files of concurrent writers within one process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Replace `path` with `content`.
///
/// The bytes go to a sibling temp file under an exclusive fs2 lock, are
/// synced, and then renamed over the target. Missing parent directories
/// are created.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Temp file in the same directory keeps the rename on one filesystem
    let temp_name = format!(
        ".{}.{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    let outcome = fill_locked(temp_file, content, &temp_path, &native_path)
        .and_then(|()| fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e)));
    if let Err(e) = outcome {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    debug!(path = %path, bytes = content.len(), "atomic write complete");
    Ok(())
}

/// Write and sync `content` under an exclusive lock. The handle is closed
/// on return.
fn fill_locked(mut file: File, content: &[u8], temp_path: &Path, target: &Path) -> Result<()> {
    file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })?;
    file.write_all(content).map_err(|e| Error::io(temp_path, e))?;
    file.sync_all().map_err(|e| Error::io(temp_path, e))?;
    file.unlock().map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })
}

pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Read a file while holding a shared lock on it.
///
/// Reads through the locked handle so a concurrent atomic writer cannot
/// swap the file between the lock and the read.
pub fn read_locked(path: &NormalizedPath) -> Result<Vec<u8>> {
    let native_path = path.to_native();
    let file = File::open(&native_path).map_err(|e| Error::io(&native_path, e))?;
    file.lock_shared().map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    let mut content = Vec::new();
    (&file)
        .read_to_end(&mut content)
        .map_err(|e| Error::io(&native_path, e))?;

    Ok(content)
}

/// Copy an existing file to `<path><suffix>` before it gets replaced.
///
/// Returns `false` when there was nothing to back up.
pub fn backup_existing(path: &NormalizedPath, suffix: &str) -> Result<bool> {
    if !path.is_file() {
        return Ok(false);
    }
    let backup = path.with_appended_suffix(suffix);
    fs::copy(path.to_native(), backup.to_native()).map_err(|e| Error::io(backup.to_native(), e))?;
    debug!(path = %path, backup = %backup, "previous version backed up");
    Ok(true)
}

/// Write content atomically unless the file already holds exactly `content`.
///
/// Returns `true` if the file was written.
pub fn write_if_changed(path: &NormalizedPath, content: &[u8]) -> Result<bool> {
    match fs::read(path.to_native()) {
        Ok(existing) if existing == content => Ok(false),
        _ => write_atomic(path, content).map(|()| true),
    }
}

/// List the children of a directory, sorted by path.
pub fn list_dir(path: &NormalizedPath) -> Result<Vec<NormalizedPath>> {
    let native_path = path.to_native();
    let mut children = fs::read_dir(&native_path)
        .map_err(|e| Error::io(&native_path, e))?
        .map(|entry| {
            entry
                .map(|e| NormalizedPath::new(e.path()))
                .map_err(|e| Error::io(&native_path, e))
        })
        .collect::<Result<Vec<_>>>()?;
    children.sort();
    Ok(children)
}

pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Rename a directory, creating the destination's parent first.
pub fn move_dir(from: &NormalizedPath, to: &NormalizedPath) -> Result<()> {
    let target = to.to_native();
    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::rename(from.to_native(), &target).map_err(|e| Error::io(&target, e))?;
    debug!(from = %from, to = %to, "directory moved");
    Ok(())
}

/// An exclusive advisory lock on a sidecar file, released on drop.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Block until the exclusive lock on `<path>.lock` is held.
///
/// The lock file is created if needed and left in place afterwards.
pub fn lock_exclusive(path: &NormalizedPath) -> Result<FileLock> {
    let lock_path = path.with_appended_suffix(".lock").to_native();
    if let Some(parent) = lock_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|e| Error::io(&lock_path, e))?;
    file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: lock_path.clone(),
    })?;
    debug!(path = %lock_path.display(), "exclusive lock acquired");
    Ok(FileLock {
        file,
        path: lock_path,
    })
}
