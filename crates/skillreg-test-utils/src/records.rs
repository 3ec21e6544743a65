//! Raw record builders.

use chrono::{DateTime, TimeZone, Utc};
use skillreg_core::RawRecord;

/// Midnight UTC on the given day of January 2026.
///
/// Merge runs take their timestamp as an argument; tests use this to keep
/// snapshots byte-for-byte reproducible.
pub fn day(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, day, 0, 0, 0).unwrap()
}

/// Shorthand for a record with origin coordinates and a display name.
pub fn record(repo: &str, path: &str, name: &str) -> RawRecord {
    RecordBuilder::new(repo, path).name(name).build()
}

/// Builder for [`RawRecord`] fixtures.
///
/// ```rust
/// use skillreg_test_utils::RecordBuilder;
///
/// let raw = RecordBuilder::new("anthropics/skills", "skills/pdf")
///     .name("PDF Tools")
///     .stars(10)
///     .build();
/// assert_eq!(raw.stars, 10);
/// ```
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: RawRecord,
}

impl RecordBuilder {
    pub fn new(repo: &str, path: &str) -> Self {
        Self {
            record: RawRecord {
                origin_repo: repo.to_string(),
                origin_path: path.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.record.display_name = name.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.record.description = description.to_string();
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.record.category = category.to_string();
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.record.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn stars(mut self, stars: u64) -> Self {
        self.record.stars = stars;
        self
    }

    pub fn license(mut self, license: &str) -> Self {
        self.record.license = Some(license.to_string());
        self
    }

    pub fn last_seen(mut self, at: DateTime<Utc>) -> Self {
        self.record.last_seen = Some(at);
        self
    }

    pub fn build(self) -> RawRecord {
        self.record
    }
}
