//! When did a line first (or last) enter version control.

mod git;

pub use git::GitMiner;

use anyhow::Result;
use guessreq_domain::{split_requirement_line, top_level_import};
use time::OffsetDateTime;

/// Which added line to look for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinePattern {
    /// `import <name>` / `from <name>` in any Python source.
    Import { name: String },
    /// A `<name>[op version]` entry in the requirements file.
    ManifestEntry { name: String },
}

impl LinePattern {
    pub fn import(name: impl Into<String>) -> Self {
        Self::Import { name: name.into() }
    }

    pub fn manifest_entry(name: impl Into<String>) -> Self {
        Self::ManifestEntry { name: name.into() }
    }

    #[must_use]
    pub fn kind(&self) -> LineKind {
        match self {
            Self::Import { .. } => LineKind::Import,
            Self::ManifestEntry { .. } => LineKind::ManifestEntry,
        }
    }

    /// Lowercased name, the form [`LineKind::name_in`] produces.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Import { name } | Self::ManifestEntry { name } => name.to_ascii_lowercase(),
        }
    }

    #[must_use]
    pub fn matches(&self, line: &str) -> bool {
        self.kind()
            .name_in(line)
            .is_some_and(|found| found == self.key())
    }
}

/// The file set a pattern is searched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Import,
    ManifestEntry,
}

impl LineKind {
    /// Lowercased package name an added `line` of this kind contributes.
    #[must_use]
    pub fn name_in(self, line: &str) -> Option<String> {
        match self {
            Self::Import => top_level_import(line).map(str::to_ascii_lowercase),
            Self::ManifestEntry => {
                split_requirement_line(line).map(|(name, _)| name.to_ascii_lowercase())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Occurrence {
    #[default]
    Earliest,
    Latest,
}

pub trait CommitDateMiner {
    /// Author timestamp of the earliest (or latest) commit that added a line
    /// matching `pattern`. `Ok(None)` when no such commit exists.
    fn introduced_at(
        &self,
        pattern: &LinePattern,
        occurrence: Occurrence,
    ) -> Result<Option<OffsetDateTime>>;
}
