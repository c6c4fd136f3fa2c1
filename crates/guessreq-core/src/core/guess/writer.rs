use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::prompt::Prompter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Declined,
}

/// Write the rendered manifest, asking first when `path` already exists.
pub(crate) fn write_manifest(
    path: &Path,
    contents: &str,
    prompter: &dyn Prompter,
) -> Result<WriteOutcome> {
    if path.exists() {
        let question = format!(
            "File {} already exists, are you sure you want to overwrite it?",
            path.display()
        );
        if !prompter.confirm(&question)? {
            tracing::info!(path = %path.display(), "kept existing requirements file");
            return Ok(WriteOutcome::Declined);
        }
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "requirements file written");
    Ok(WriteOutcome::Written)
}
