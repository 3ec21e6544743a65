use skillreg_fs::{NormalizedPath, io};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_write_atomic_creates_file_and_parents() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("nested/dir/registry.json"));

    io::write_atomic(&path, b"{}").unwrap();

    let content = fs::read_to_string(path.to_native()).unwrap();
    assert_eq!(content, "{}");
}

#[test]
fn test_write_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("registry.json");
    fs::write(&file_path, "original").unwrap();

    let path = NormalizedPath::new(&file_path);
    io::write_atomic(&path, b"updated").unwrap();

    assert_eq!(fs::read_to_string(&file_path).unwrap(), "updated");
}

#[test]
fn test_write_atomic_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("registry.json"));

    io::write_atomic(&path, b"content").unwrap();

    let names: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["registry.json".to_string()]);
}

#[test]
fn test_read_locked_returns_content() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("registry.json");
    fs::write(&file_path, "locked read").unwrap();

    let content = io::read_locked(&NormalizedPath::new(&file_path)).unwrap();
    assert_eq!(content, b"locked read");
}

#[test]
fn test_read_missing_file_is_not_found() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("missing.json"));

    let err = io::read_locked(&path).unwrap_err();
    assert!(err.is_not_found());
    assert!(io::read_text(&path).unwrap_err().is_not_found());
}

#[test]
fn test_backup_existing_copies_previous_version() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("registry.json");
    fs::write(&file_path, "v1").unwrap();
    let path = NormalizedPath::new(&file_path);

    assert!(io::backup_existing(&path, ".bak").unwrap());
    io::write_text(&path, "v2").unwrap();

    assert_eq!(
        fs::read_to_string(temp.path().join("registry.json.bak")).unwrap(),
        "v1"
    );
    assert_eq!(fs::read_to_string(&file_path).unwrap(), "v2");
}

#[test]
fn test_backup_existing_without_file_is_noop() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("registry.json"));

    assert!(!io::backup_existing(&path, ".bak").unwrap());
    assert!(!temp.path().join("registry.json.bak").exists());
}

#[test]
fn test_write_if_changed_skips_identical_content() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("metadata.json"));

    assert!(io::write_if_changed(&path, b"same").unwrap());
    assert!(!io::write_if_changed(&path, b"same").unwrap());
    assert!(io::write_if_changed(&path, b"different").unwrap());
    assert_eq!(fs::read_to_string(path.to_native()).unwrap(), "different");
}

#[test]
fn test_list_dir_is_sorted() {
    let temp = TempDir::new().unwrap();
    let root = NormalizedPath::new(temp.path());
    io::write_text(&root.join("b.json"), "{}").unwrap();
    io::write_text(&root.join("a.json"), "{}").unwrap();
    std::fs::create_dir(temp.path().join("c")).unwrap();

    let names: Vec<String> = io::list_dir(&root)
        .unwrap()
        .iter()
        .filter_map(|p| p.file_name().map(str::to_string))
        .collect();
    assert_eq!(names, vec!["a.json", "b.json", "c"]);
}

#[test]
fn test_write_atomic_failure_removes_temp_file() {
    let temp = TempDir::new().unwrap();
    // A non-empty directory at the target makes the final rename fail
    let target = temp.path().join("registry.json");
    fs::create_dir(&target).unwrap();
    fs::write(target.join("keep"), "x").unwrap();

    let result = io::write_atomic(&NormalizedPath::new(&target), b"{}");
    assert!(result.is_err());

    let leftovers: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temp files left behind: {:?}", leftovers);
}

#[test]
fn test_move_dir_creates_parent() {
    let temp = TempDir::new().unwrap();
    let root = NormalizedPath::new(temp.path());
    io::write_text(&root.join("development/pdf/metadata.json"), "{}").unwrap();

    io::move_dir(&root.join("development/pdf"), &root.join("documents/pdf")).unwrap();

    assert!(!temp.path().join("development/pdf").exists());
    assert_eq!(
        fs::read_to_string(temp.path().join("documents/pdf/metadata.json")).unwrap(),
        "{}"
    );
}

#[test]
fn test_lock_exclusive_uses_sidecar_and_releases_on_drop() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("registry.json"));

    let lock = io::lock_exclusive(&path).unwrap();
    assert_eq!(lock.path(), temp.path().join("registry.json.lock"));
    assert!(!temp.path().join("registry.json").exists());
    drop(lock);

    // Re-acquiring would block forever if the first lock were still held
    let again = io::lock_exclusive(&path).unwrap();
    drop(again);
}
