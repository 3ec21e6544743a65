//! Tests for paired publication

use std::cell::Cell;

use pretty_assertions::assert_eq;
use skillreg_core::{
    ArchiveManifest, ContentRef, ContentStore, DirContentStore, Error, Layout, MergeCoordinator,
    MergeOptions, PinFile, Publisher, RegistryStore, Result,
};
use skillreg_fs::NormalizedPath;
use skillreg_test_utils::{TestWorkspace, day, record};

/// Archive store whose writes can be switched off.
struct FlakyStore {
    inner: DirContentStore,
    fail_put: Cell<bool>,
}

impl ContentStore for FlakyStore {
    fn put(&self, bytes: &[u8]) -> Result<ContentRef> {
        if self.fail_put.get() {
            return Err(Error::StoreIo(skillreg_fs::Error::LockFailed {
                path: self.inner.root().to_native(),
            }));
        }
        self.inner.put(bytes)
    }

    fn get(&self, reference: &ContentRef) -> Result<Vec<u8>> {
        self.inner.get(reference)
    }

    fn contains(&self, reference: &ContentRef) -> bool {
        self.inner.contains(reference)
    }
}

fn populated_store(extra: bool) -> RegistryStore {
    let mut records = vec![
        record("a/x", "skills/pdf", "PDF Tools"),
        record("b/y", "skills/pdf", "PDF Tools"),
    ];
    if extra {
        records.push(record("c/z", "docs", "Docs"));
    }
    let mut store = RegistryStore::new();
    MergeCoordinator::default()
        .run(&mut store, &records, &MergeOptions::new(day(1)))
        .unwrap();
    store
}

fn publisher(ws: &TestWorkspace) -> Publisher<DirContentStore, FlakyStore> {
    publisher_with_archive(ws, false)
}

fn publisher_with_archive(ws: &TestWorkspace, fail: bool) -> Publisher<DirContentStore, FlakyStore> {
    Publisher::new(
        DirContentStore::new(ws.logic_store()),
        FlakyStore {
            inner: DirContentStore::new(ws.archive_store()),
            fail_put: Cell::new(fail),
        },
        NormalizedPath::new(ws.pin()),
        Layout::default(),
    )
}

#[test]
fn test_publish_pins_both_halves() {
    let ws = TestWorkspace::new();
    let publisher = publisher(&ws);
    let store = populated_store(false);

    let pin = publisher.publish(&store, day(2)).unwrap();
    assert_eq!(pin.generation, 1);
    assert_eq!(pin.entry_count, 2);
    assert_eq!(pin.published_at, day(2));

    let pair = publisher.read_current().unwrap();
    assert_eq!(pair.snapshot, store.to_snapshot());
    assert_eq!(pair.manifest.logic_ref, pin.logic.as_str());
    let dirs: Vec<_> = pair.manifest.entries.iter().map(|e| e.dir.as_str()).collect();
    assert_eq!(dirs, vec!["other/pdf-tools", "other/pdf-tools-b-y"]);
}

#[test]
fn test_republish_of_same_registry_keeps_pin() {
    let ws = TestWorkspace::new();
    let publisher = publisher(&ws);
    let store = populated_store(false);

    let first = publisher.publish(&store, day(2)).unwrap();
    let second = publisher.publish(&store, day(3)).unwrap();
    assert_eq!(first, second);

    let pins = PinFile::load(&NormalizedPath::new(ws.pin())).unwrap();
    assert!(pins.history.is_empty());
}

#[test]
fn test_new_content_advances_generation() {
    let ws = TestWorkspace::new();
    let publisher = publisher(&ws);

    let first = publisher.publish(&populated_store(false), day(2)).unwrap();
    let second = publisher.publish(&populated_store(true), day(3)).unwrap();
    assert_eq!(second.generation, 2);
    assert_ne!(first.logic, second.logic);

    let pins = PinFile::load(&NormalizedPath::new(ws.pin())).unwrap();
    assert_eq!(pins.current, Some(second));
    assert_eq!(pins.history, vec![first]);
}

#[test]
fn test_failed_archive_leaves_pin_unchanged() {
    let ws = TestWorkspace::new();
    let publisher = publisher(&ws);
    let first = publisher.publish(&populated_store(false), day(2)).unwrap();
    let pin_before = ws.read_file("pin.json");

    let failing = publisher_with_archive(&ws, true);
    assert!(failing.publish(&populated_store(true), day(3)).is_err());

    assert_eq!(ws.read_file("pin.json"), pin_before);
    assert_eq!(publisher.read_current().unwrap().pin, first);
}

#[test]
fn test_failure_before_first_publish_writes_no_pin() {
    let ws = TestWorkspace::new();
    let failing = publisher_with_archive(&ws, true);
    assert!(failing.publish(&populated_store(false), day(2)).is_err());
    ws.assert_file_not_exists("pin.json");
}

#[test]
fn test_mismatched_archive_is_rejected_on_read() {
    let ws = TestWorkspace::new();
    let publisher = publisher(&ws);
    let pin = publisher.publish(&populated_store(false), day(2)).unwrap();

    // Point the pin at an archive built from some other logic snapshot
    let archive = DirContentStore::new(ws.archive_store());
    let foreign = ArchiveManifest {
        logic_ref: ContentRef::of(b"other").to_string(),
        entry_count: 0,
        entries: Vec::new(),
    };
    let foreign_ref = archive.put(&foreign.to_json_bytes().unwrap()).unwrap();

    let pin_path = NormalizedPath::new(ws.pin());
    let mut pins = PinFile::load(&pin_path).unwrap();
    let mut forged = pin.clone();
    forged.archive = foreign_ref;
    forged.generation += 1;
    pins.advance(forged);
    pins.save(&pin_path).unwrap();

    assert!(matches!(
        publisher.read_current(),
        Err(Error::PinMismatch { .. })
    ));
}
