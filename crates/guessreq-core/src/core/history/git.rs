use std::cell::OnceCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use git2::{Commit, DiffDelta, DiffHunk, DiffLine, DiffOptions, Repository};
use time::OffsetDateTime;

use super::{CommitDateMiner, LineKind, LinePattern, Occurrence};
use crate::core::tooling::errors::GuessError;

/// Commit-date miner backed by libgit2 diffs.
///
/// Every non-merge commit reachable from `HEAD` is diffed against its first
/// parent once, on the first query; only added lines are recorded.
pub struct GitMiner {
    repo: Repository,
    sources_spec: String,
    manifest_spec: String,
    added: OnceCell<AddedLines>,
}

/// Author times bounding the commits that added one name.
#[derive(Debug, Clone, Copy)]
struct Span {
    earliest: OffsetDateTime,
    latest: OffsetDateTime,
}

impl Span {
    fn widen(&mut self, when: OffsetDateTime) {
        self.earliest = self.earliest.min(when);
        self.latest = self.latest.max(when);
    }

    fn pick(self, occurrence: Occurrence) -> OffsetDateTime {
        match occurrence {
            Occurrence::Earliest => self.earliest,
            Occurrence::Latest => self.latest,
        }
    }
}

#[derive(Debug, Default)]
struct AddedLines {
    spans: HashMap<(LineKind, String), Span>,
}

impl AddedLines {
    fn record(&mut self, kind: LineKind, name: String, when: OffsetDateTime) {
        self.spans
            .entry((kind, name))
            .and_modify(|span| span.widen(when))
            .or_insert(Span {
                earliest: when,
                latest: when,
            });
    }

    fn lookup(&self, pattern: &LinePattern, occurrence: Occurrence) -> Option<OffsetDateTime> {
        self.spans
            .get(&(pattern.kind(), pattern.key()))
            .map(|span| span.pick(occurrence))
    }
}

impl GitMiner {
    /// Open the repository containing `project_root`.
    ///
    /// `manifest` is resolved against `project_root` when relative.
    pub fn discover(project_root: &Path, manifest: &Path) -> Result<Self, GuessError> {
        let not_a_repository = || GuessError::NotARepository {
            path: project_root.to_path_buf(),
        };
        let repo = Repository::discover(project_root).map_err(|err| {
            tracing::debug!(%err, "repository discovery failed");
            not_a_repository()
        })?;
        let workdir = repo.workdir().map(normalize).ok_or_else(not_a_repository)?;

        let root = normalize(project_root);
        let sources_spec = match relative_spec(&workdir, &root) {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}/*.py"),
            _ => "*.py".to_string(),
        };
        let manifest_abs = if manifest.is_absolute() {
            manifest.to_path_buf()
        } else {
            project_root.join(manifest)
        };
        let manifest_spec = relative_spec(&workdir, &normalize(&manifest_abs))
            .filter(|spec| !spec.is_empty())
            .unwrap_or_else(|| {
                tracing::warn!(
                    manifest = %manifest.display(),
                    "requirements file is outside the repository; matching by file name"
                );
                manifest
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
        tracing::debug!(%sources_spec, %manifest_spec, "history search scopes");

        Ok(Self {
            repo,
            sources_spec,
            manifest_spec,
            added: OnceCell::new(),
        })
    }

    fn added_lines(&self) -> Result<&AddedLines> {
        if let Some(added) = self.added.get() {
            return Ok(added);
        }
        let collected = self.collect_added_lines()?;
        Ok(self.added.get_or_init(|| collected))
    }

    fn collect_added_lines(&self) -> Result<AddedLines> {
        let mut added = AddedLines::default();
        let mut walk = self.repo.revwalk()?;
        if let Err(err) = walk.push_head() {
            tracing::debug!(%err, "no commits to inspect");
            return Ok(added);
        }

        let mut commits = 0_usize;
        for oid in walk {
            let commit = self.repo.find_commit(oid?)?;
            if commit.parent_count() > 1 {
                continue;
            }
            self.record_commit(&commit, &mut added)?;
            commits += 1;
        }
        tracing::debug!(commits, names = added.spans.len(), "history indexed");
        Ok(added)
    }

    /// Record every import or requirements line `commit` adds.
    fn record_commit(&self, commit: &Commit<'_>, added: &mut AddedLines) -> Result<()> {
        let when = author_time(commit)?;
        let tree = commit.tree()?;
        let parent_tree = if commit.parent_count() == 0 {
            None
        } else {
            Some(commit.parent(0)?.tree()?)
        };
        let mut options = DiffOptions::new();
        options
            .pathspec(self.sources_spec.as_str())
            .pathspec(self.manifest_spec.as_str());
        let diff =
            self.repo
                .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut options))?;

        let manifest_path = Path::new(&self.manifest_spec);
        diff.foreach(
            &mut |_delta: DiffDelta<'_>, _progress: f32| true,
            None,
            None,
            Some(
                &mut |delta: DiffDelta<'_>, _hunk: Option<DiffHunk<'_>>, line: DiffLine<'_>| {
                    if line.origin() != '+' {
                        return true;
                    }
                    let kind = if delta.new_file().path() == Some(manifest_path) {
                        LineKind::ManifestEntry
                    } else {
                        LineKind::Import
                    };
                    if let Some(name) = kind.name_in(&String::from_utf8_lossy(line.content())) {
                        added.record(kind, name, when);
                    }
                    true
                },
            ),
        )?;
        Ok(())
    }
}

impl CommitDateMiner for GitMiner {
    fn introduced_at(
        &self,
        pattern: &LinePattern,
        occurrence: Occurrence,
    ) -> Result<Option<OffsetDateTime>> {
        Ok(self.added_lines()?.lookup(pattern, occurrence))
    }
}

fn author_time(commit: &Commit<'_>) -> Result<OffsetDateTime> {
    let seconds = commit.author().when().seconds();
    OffsetDateTime::from_unix_timestamp(seconds)
        .with_context(|| format!("commit {} has an invalid author time", commit.id()))
}

/// Canonical form of `path`, tolerating a missing final component.
fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => fs::canonicalize(parent)
            .map(|parent| parent.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

/// `path` relative to `base` with `/` separators, as git pathspecs expect.
fn relative_spec(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}
