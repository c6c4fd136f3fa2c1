//! From a project checkout to a pinned requirements file.

mod orchestrator;
mod writer;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use guessreq_domain::{
    local_modules, read_manifest, render_manifest, scan_imports, PackageTable, ResolvedPackage,
};
use serde_json::{json, Value};
use time::Date;

pub use orchestrator::Guesser;

use crate::config::context::CommandContext;
use crate::core::tooling::errors::GuessError;
use crate::history::Occurrence;
use crate::mapping::MappingAssets;
use crate::outcome::ExecutionOutcome;
use writer::{write_manifest, WriteOutcome};

/// Inputs of one `guessreq` run.
#[derive(Debug, Clone, Default)]
pub struct GuessRequest {
    pub project_root: PathBuf,
    /// Manifest to read, relative to `project_root` unless absolute.
    pub requirements: PathBuf,
    /// Where to write the result; nothing is written when unset.
    pub write: Option<PathBuf>,
    pub force_guess: Vec<String>,
    pub keep_unused_packages: bool,
    pub include_prereleases: bool,
    pub latest_addition: bool,
    pub refresh_mapping: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GuessOptions {
    pub keep_unused_packages: bool,
    pub include_prereleases: bool,
    pub occurrence: Occurrence,
}

impl From<&GuessRequest> for GuessOptions {
    fn from(request: &GuessRequest) -> Self {
        Self {
            keep_unused_packages: request.keep_unused_packages,
            include_prereleases: request.include_prereleases,
            occurrence: if request.latest_addition {
                Occurrence::Latest
            } else {
                Occurrence::Earliest
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoRegistryMatch,
    Unused,
    NoHistory,
    PromptCancelled,
}

impl SkipReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoRegistryMatch => "no_pypi_match",
            Self::Unused => "unused",
            Self::NoHistory => "no_history",
            Self::PromptCancelled => "prompt_cancelled",
        }
    }

    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::NoRegistryMatch => "no releases found on PyPI",
            Self::Unused => "never imported in committed code (use --keep-unused-packages to keep it)",
            Self::NoHistory => "couldn't attribute a version; are the changes committed?",
            Self::PromptCancelled => "no guessing strategy chosen",
        }
    }
}

/// Which history path produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    Import,
    Requirements,
}

impl CandidateSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Requirements => "requirements",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Import => "First time the package was imported",
            Self::Requirements => "When the package was added to requirements.txt",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    source: CandidateSource,
    version: String,
    date: Date,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOutcome {
    Pinned {
        version: String,
    },
    Resolved {
        version: String,
        source: CandidateSource,
        date: Date,
    },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReport {
    pub name: String,
    pub outcome: PackageOutcome,
}

impl PackageReport {
    fn to_json(&self) -> Value {
        match &self.outcome {
            PackageOutcome::Pinned { version } => json!({
                "name": self.name,
                "status": "pinned",
                "version": version,
            }),
            PackageOutcome::Resolved {
                version,
                source,
                date,
            } => json!({
                "name": self.name,
                "status": "resolved",
                "version": version,
                "source": source.as_str(),
                "date": date.to_string(),
            }),
            PackageOutcome::Skipped(reason) => json!({
                "name": self.name,
                "status": "skipped",
                "reason": reason.as_str(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GuessReport {
    pub packages: Vec<PackageReport>,
}

impl GuessReport {
    /// Packages that end up in the rendered manifest.
    #[must_use]
    pub fn resolved(&self) -> Vec<ResolvedPackage> {
        self.packages
            .iter()
            .filter_map(|package| match &package.outcome {
                PackageOutcome::Pinned { version } | PackageOutcome::Resolved { version, .. } => {
                    Some(ResolvedPackage {
                        name: package.name.clone(),
                        version: version.clone(),
                    })
                }
                PackageOutcome::Skipped(_) => None,
            })
            .collect()
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, SkipReason)> {
        self.packages
            .iter()
            .filter_map(|package| match package.outcome {
                PackageOutcome::Skipped(reason) => Some((package.name.as_str(), reason)),
                _ => None,
            })
    }
}

/// Run a full guess for `request`.
///
/// Fatal preconditions come back as a user-error outcome. Declining the
/// mapping download ends the run with a successful outcome and nothing
/// guessed. Anything else unexpected is returned as an error.
///
/// # Errors
/// Returns an error on I/O failures outside the documented preconditions.
pub fn guess_requirements(ctx: &CommandContext, request: &GuessRequest) -> Result<ExecutionOutcome> {
    match run_guess(ctx, request) {
        Ok(outcome) => Ok(outcome),
        Err(err) => match err.downcast::<GuessError>() {
            Ok(guess_err) if guess_err.is_declined() => {
                tracing::debug!("mapping download declined");
                Ok(ExecutionOutcome::success(
                    guess_err.to_string(),
                    json!({
                        "cache_dir": ctx.config().mapping().cache_dir.display().to_string(),
                        "hint": guess_err.hint(),
                    }),
                ))
            }
            Ok(guess_err) => {
                tracing::debug!(error = ?guess_err, "guess aborted");
                Ok(ExecutionOutcome::user_error(
                    guess_err.to_string(),
                    json!({ "hint": guess_err.hint() }),
                ))
            }
            Err(other) => Err(other),
        },
    }
}

fn run_guess(ctx: &CommandContext, request: &GuessRequest) -> Result<ExecutionOutcome> {
    let effects = ctx.effects();
    let root = request.project_root.as_path();
    let manifest_path = resolve(root, &request.requirements);

    let miner = effects.open_history(root, &manifest_path)?;

    let mapping = effects.mapping();
    let assets = if request.refresh_mapping {
        mapping.refresh()
    } else {
        mapping.load()
    };
    let MappingAssets {
        mapping,
        stdlib: mut excluded,
    } = assets.map_err(GuessError::from)?;

    let force_guess: BTreeSet<String> = request.force_guess.iter().cloned().collect();
    let local = local_modules(root, &force_guess);
    if !local.is_empty() {
        let names: Vec<&str> = local.iter().map(String::as_str).collect();
        tracing::info!(
            modules = %names.join(", "),
            "local modules are not guessed (use --force-guess to override)"
        );
    }
    excluded.extend(local);

    let scan = scan_imports(root, &excluded)?;
    if scan.found_nothing() {
        return Err(GuessError::NoImportsFound {
            root: root.to_path_buf(),
        }
        .into());
    }
    let imports = scan.modules;
    let manifest = read_manifest(&manifest_path)?;
    let table = PackageTable::build(&manifest, &imports, &mapping);
    tracing::debug!(
        imports = imports.len(),
        manifest = manifest.len(),
        packages = table.len(),
        "package table built"
    );

    let guesser = Guesser::new(
        effects.registry(),
        miner.as_ref(),
        effects.prompter(),
        GuessOptions::from(request),
    );
    let report = guesser.run(&table)?;
    let resolved = report.resolved();
    let rendered = render_manifest(&resolved);

    let written = match &request.write {
        Some(target) => {
            let path = resolve(root, target);
            match write_manifest(&path, &rendered, effects.prompter())? {
                WriteOutcome::Written => Some(path),
                WriteOutcome::Declined => None,
            }
        }
        None => None,
    };

    let skipped: Vec<Value> = report
        .skipped()
        .map(|(name, reason)| json!({ "name": name, "reason": reason.as_str() }))
        .collect();
    let hint = request
        .write
        .is_none()
        .then_some("use --write [PATH] to save the requirements file");
    let details = json!({
        "packages": report.packages.iter().map(PackageReport::to_json).collect::<Vec<_>>(),
        "skipped": skipped,
        "requirements": rendered,
        "written": written.as_ref().map(|path| path.display().to_string()),
        "hint": hint,
    });
    Ok(ExecutionOutcome::success(
        format!(
            "guessed requirements for {} of {} packages",
            resolved.len(),
            report.packages.len()
        ),
        details,
    ))
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
