//! Pin file: the single record naming the published snapshot pair

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillreg_fs::{NormalizedPath, io};

use super::content::ContentRef;
use crate::{Error, Result};

/// One published logic/archive pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishPin {
    pub logic: ContentRef,
    pub archive: ContentRef,
    pub published_at: DateTime<Utc>,
    pub generation: u64,
    pub entry_count: usize,
}

impl PublishPin {
    /// Whether both halves match another pin.
    pub fn same_pair(&self, other: &PublishPin) -> bool {
        self.logic == other.logic && self.archive == other.archive
    }
}

/// On-disk pin record with the previous pins kept as history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinFile {
    #[serde(default)]
    pub current: Option<PublishPin>,
    #[serde(default)]
    pub history: Vec<PublishPin>,
}

impl PinFile {
    /// Load the pin file, empty if it does not exist yet.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        match io::read_locked(path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.is_not_found() => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Rewrite the pin file atomically.
    pub fn save(&self, path: &NormalizedPath) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        io::write_atomic(path, &bytes)?;
        Ok(())
    }

    pub fn next_generation(&self) -> u64 {
        self.current.as_ref().map_or(1, |pin| pin.generation + 1)
    }

    /// Make `pin` current, moving the previous pin to history.
    pub fn advance(&mut self, pin: PublishPin) {
        if let Some(previous) = self.current.replace(pin) {
            self.history.push(previous);
        }
    }

    pub fn require_current(&self, path: &NormalizedPath) -> Result<&PublishPin> {
        self.current.as_ref().ok_or_else(|| Error::NotPublished {
            path: path.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn pin(generation: u64) -> PublishPin {
        PublishPin {
            logic: ContentRef::of(format!("logic{}", generation).as_bytes()),
            archive: ContentRef::of(format!("archive{}", generation).as_bytes()),
            published_at: Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap(),
            generation,
            entry_count: 3,
        }
    }

    #[test]
    fn advance_keeps_history() {
        let mut file = PinFile::default();
        assert_eq!(file.next_generation(), 1);
        file.advance(pin(1));
        file.advance(pin(2));
        assert_eq!(file.current, Some(pin(2)));
        assert_eq!(file.history, vec![pin(1)]);
        assert_eq!(file.next_generation(), 3);
    }

    #[test]
    fn save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = NormalizedPath::new(temp.path().join("pin.json"));
        assert_eq!(PinFile::load(&path).unwrap(), PinFile::default());
        assert!(PinFile::default().require_current(&path).is_err());

        let mut file = PinFile::default();
        file.advance(pin(1));
        file.save(&path).unwrap();
        assert_eq!(PinFile::load(&path).unwrap(), file);
    }
}
