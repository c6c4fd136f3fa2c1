use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Result;
use walkdir::{DirEntry, WalkDir};

use crate::mapping::StdlibSet;

/// Top-level module named by an `import X` or `from X` line.
///
/// Relative imports (`from . import x`) name nothing and yield `None`.
pub fn top_level_import(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let rest = trimmed
        .strip_prefix("import ")
        .or_else(|| trimmed.strip_prefix("from "))?
        .trim_start();
    let end = rest
        .find(|ch: char| !(ch.is_alphanumeric() || ch == '_'))
        .unwrap_or(rest.len());
    let name = &rest[..end];
    (!name.is_empty()).then_some(name)
}

/// All `.py` files under `root`, skipping hidden directories and virtualenvs.
pub fn discover_python_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_ignored_dir(entry))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::debug!(%err, "skipping unreadable path");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(DirEntry::into_path)
        .filter(|path| path.extension().is_some_and(|ext| ext == "py"))
        .collect();
    files.sort();
    files
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let hidden = entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'));
    hidden || entry.path().join("pyvenv.cfg").is_file()
}

/// Names importable from the project itself: each top-level `.py` file stem
/// and each top-level directory holding Python sources. Names listed in
/// `force_guess` are left out so they are still looked up remotely.
pub fn local_modules(root: &Path, force_guess: &BTreeSet<String>) -> BTreeSet<String> {
    discover_python_files(root)
        .iter()
        .filter_map(|path| path.strip_prefix(root).ok())
        .filter_map(|relative| {
            let mut components = relative.components();
            let first = components.next()?.as_os_str().to_str()?;
            let module = if components.next().is_none() {
                first.strip_suffix(".py").unwrap_or(first)
            } else {
                first
            };
            Some(module.to_string())
        })
        .filter(|module| !force_guess.contains(module))
        .collect()
}

/// Result of scanning a project's sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportScan {
    /// Third-party top-level modules.
    pub modules: BTreeSet<String>,
    /// Import lines seen before standard-library and local names were dropped.
    pub statements: usize,
}

impl ImportScan {
    /// True when no file under the root imports anything at all.
    pub fn found_nothing(&self) -> bool {
        self.statements == 0
    }
}

/// Collect every third-party top-level import under `root`.
///
/// Names in `excluded` (standard library plus local modules) are dropped but
/// still counted in [`ImportScan::statements`].
pub fn scan_imports(root: &Path, excluded: &StdlibSet) -> Result<ImportScan> {
    let mut scan = ImportScan::default();
    for path in discover_python_files(root) {
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "could not read source file");
                continue;
            }
        };
        let contents = String::from_utf8_lossy(&bytes);
        for name in contents.lines().filter_map(top_level_import) {
            scan.statements += 1;
            if !excluded.contains(name) {
                scan.modules.insert(name.to_string());
            }
        }
    }
    tracing::debug!(
        statements = scan.statements,
        modules = scan.modules.len(),
        "scanned imports"
    );
    Ok(scan)
}
