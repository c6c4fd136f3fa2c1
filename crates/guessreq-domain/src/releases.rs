use std::{cmp::Ordering, str::FromStr};

use pep440_rs::Version;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEntry {
    pub version: String,
    pub release_date: OffsetDateTime,
}

impl ReleaseEntry {
    pub fn new(version: impl Into<String>, release_date: OffsetDateTime) -> Self {
        Self {
            version: version.into(),
            release_date,
        }
    }
}

/// Published releases of one package, newest first.
///
/// Releases sharing a date are ordered by descending version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseHistory {
    entries: Vec<ReleaseEntry>,
}

impl ReleaseHistory {
    pub fn new(mut entries: Vec<ReleaseEntry>) -> Self {
        entries.sort_by(|a, b| {
            b.release_date
                .cmp(&a.release_date)
                .then_with(|| compare_versions(&b.version, &a.version))
        });
        Self { entries }
    }

    pub fn entries(&self) -> &[ReleaseEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn version_at(&self, date: OffsetDateTime) -> Option<&str> {
        version_at_date(&self.entries, date)
    }
}

/// Heuristic prerelease check: any letter in the version (`1.2rc1`, `2.0b3`).
pub fn is_prerelease(version: &str) -> bool {
    version.chars().any(|ch| ch.is_ascii_alphabetic())
}

/// Version current on `date`: the release with the latest date not after it.
///
/// When `date` predates every release the oldest release is returned. Ties on
/// the chosen date go to the highest version. `None` only for an empty list.
pub fn version_at_date(entries: &[ReleaseEntry], date: OffsetDateTime) -> Option<&str> {
    let by_date_then_version = |a: &&ReleaseEntry, b: &&ReleaseEntry| {
        a.release_date
            .cmp(&b.release_date)
            .then_with(|| compare_versions(&a.version, &b.version))
    };
    let current = entries
        .iter()
        .filter(|entry| entry.release_date <= date)
        .max_by(by_date_then_version);
    let chosen = match current {
        Some(entry) => entry,
        None => {
            let oldest = entries.iter().map(|entry| entry.release_date).min()?;
            entries
                .iter()
                .filter(|entry| entry.release_date == oldest)
                .max_by(by_date_then_version)?
        }
    };
    Some(chosen.version.as_str())
}

/// PEP 440 ordering; unparseable versions sort below parseable ones.
fn compare_versions(a: &str, b: &str) -> Ordering {
    match (Version::from_str(a), Version::from_str(b)) {
        (Ok(left), Ok(right)) => left.cmp(&right),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
