//! Cross-repository publication
//!
//! The registry is published as two artifacts that must always be read as a
//! pair:
//!
//! - the **logic** snapshot: the registry document itself
//! - the **archive** snapshot: the directory layout built from it
//!
//! Both go into append-only content stores. Only after both are stored and
//! read back intact is the pin file rewritten to name the new pair, so a
//! reader following the pin never sees one half without the other.

mod content;
mod pin;

pub use content::{ContentRef, ContentStore, DirContentStore};
pub use pin::{PinFile, PublishPin};

use chrono::{DateTime, Utc};
use skillreg_fs::NormalizedPath;
use tracing::{debug, info};

use crate::layout::{ArchiveManifest, Layout};
use crate::store::{RegistrySnapshot, RegistryStore};
use crate::{Error, Result};

/// The currently pinned pair, decoded
#[derive(Debug, Clone)]
pub struct PinnedPair {
    pub pin: PublishPin,
    pub snapshot: RegistrySnapshot,
    pub manifest: ArchiveManifest,
}

/// Publishes logic and archive snapshots under a single pin.
#[derive(Debug)]
pub struct Publisher<L, A> {
    logic: L,
    archive: A,
    pin_path: NormalizedPath,
    layout: Layout,
}

impl<L: ContentStore, A: ContentStore> Publisher<L, A> {
    pub fn new(logic: L, archive: A, pin_path: NormalizedPath, layout: Layout) -> Self {
        Self {
            logic,
            archive,
            pin_path,
            layout,
        }
    }

    pub fn pin_path(&self) -> &NormalizedPath {
        &self.pin_path
    }

    /// Publish the store and advance the pin.
    ///
    /// Publishing an unchanged registry returns the current pin without
    /// touching the pin file.
    ///
    /// # Errors
    ///
    /// Any failure before the final pin write leaves the pin file as it
    /// was. Objects already stored stay in their stores, unreferenced.
    pub fn publish(&self, store: &RegistryStore, at: DateTime<Utc>) -> Result<PublishPin> {
        store.verify()?;

        let snapshot = store.to_snapshot();
        let logic_ref = self.logic.put(&snapshot.to_json_bytes()?)?;
        debug!(%logic_ref, "logic snapshot stored");

        let manifest = self.layout.build_manifest(store, logic_ref.as_str())?;
        let archive_ref = self.archive.put(&manifest.to_json_bytes()?)?;
        debug!(%archive_ref, "archive snapshot stored");

        // Both halves must read back intact before the pin moves
        self.logic.get(&logic_ref)?;
        let stored = ArchiveManifest::from_json_bytes(&self.archive.get(&archive_ref)?)?;
        check_pairing(&logic_ref, &archive_ref, &stored)?;

        let mut pins = PinFile::load(&self.pin_path)?;
        let pin = PublishPin {
            logic: logic_ref,
            archive: archive_ref,
            published_at: at,
            generation: pins.next_generation(),
            entry_count: snapshot.total_count,
        };
        if let Some(current) = &pins.current
            && current.same_pair(&pin)
        {
            info!(generation = current.generation, "registry unchanged, pin kept");
            return Ok(current.clone());
        }

        pins.advance(pin.clone());
        pins.save(&self.pin_path)?;
        info!(
            generation = pin.generation,
            logic = %pin.logic,
            archive = %pin.archive,
            entries = pin.entry_count,
            "publication pinned"
        );
        Ok(pin)
    }

    /// Read the pinned pair, checking that the archive belongs to the logic
    /// snapshot named by the pin.
    pub fn read_current(&self) -> Result<PinnedPair> {
        let pins = PinFile::load(&self.pin_path)?;
        let pin = pins.require_current(&self.pin_path)?.clone();

        let snapshot = RegistrySnapshot::from_json_bytes(&self.logic.get(&pin.logic)?)?;
        let manifest = ArchiveManifest::from_json_bytes(&self.archive.get(&pin.archive)?)?;
        check_pairing(&pin.logic, &pin.archive, &manifest)?;

        Ok(PinnedPair {
            pin,
            snapshot,
            manifest,
        })
    }
}

fn check_pairing(logic: &ContentRef, archive: &ContentRef, manifest: &ArchiveManifest) -> Result<()> {
    if manifest.logic_ref != logic.as_str() {
        return Err(Error::PinMismatch {
            logic: logic.to_string(),
            archive: archive.to_string(),
            paired: manifest.logic_ref.clone(),
        });
    }
    Ok(())
}
