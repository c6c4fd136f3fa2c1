use anyhow::Result;
use guessreq_domain::{PackageRecord, PackageTable, ReleaseHistory};

use super::{
    Candidate, CandidateSource, GuessOptions, GuessReport, PackageOutcome, PackageReport,
    SkipReason,
};
use crate::core::tooling::errors::GuessError;
use crate::history::{CommitDateMiner, LinePattern};
use crate::prompt::Prompter;
use crate::registry::ReleaseHistoryProvider;

const STRATEGY_LABEL_WIDTH: usize = 50;

/// Walks every package of a run through the pinned / guessed / skipped flow.
pub struct Guesser<'a> {
    registry: &'a dyn ReleaseHistoryProvider,
    miner: &'a dyn CommitDateMiner,
    prompter: &'a dyn Prompter,
    options: GuessOptions,
}

impl<'a> Guesser<'a> {
    pub fn new(
        registry: &'a dyn ReleaseHistoryProvider,
        miner: &'a dyn CommitDateMiner,
        prompter: &'a dyn Prompter,
        options: GuessOptions,
    ) -> Self {
        Self {
            registry,
            miner,
            prompter,
            options,
        }
    }

    /// Guess a version for every unpinned package in `table`.
    ///
    /// # Errors
    /// Registry failures other than an unknown package abort the batch, as do
    /// terminal I/O errors while prompting.
    pub fn run(&self, table: &PackageTable) -> Result<GuessReport> {
        let mut packages = Vec::with_capacity(table.len());
        for record in table.iter() {
            let outcome = self.guess(record)?;
            log_outcome(record.distribution_name(), &outcome);
            packages.push(PackageReport {
                name: record.distribution_name().to_string(),
                outcome,
            });
        }
        Ok(GuessReport { packages })
    }

    fn guess(&self, record: &PackageRecord) -> Result<PackageOutcome> {
        if let Some(version) = &record.pinned_version {
            return Ok(PackageOutcome::Pinned {
                version: version.clone(),
            });
        }

        let history = self
            .registry
            .release_history(record.distribution_name(), self.options.include_prereleases)
            .map_err(GuessError::from)?;
        let Some(history) = history.filter(|history| !history.is_empty()) else {
            return Ok(PackageOutcome::Skipped(SkipReason::NoRegistryMatch));
        };

        let import_candidate = self.candidate(
            &history,
            &LinePattern::import(record.import_name()),
            CandidateSource::Import,
        );
        if import_candidate.is_none() {
            if !self.options.keep_unused_packages {
                return Ok(PackageOutcome::Skipped(SkipReason::Unused));
            }
            tracing::info!(
                package = record.distribution_name(),
                "no import found in history; guessing from the requirements file"
            );
        }

        let requirements_candidate = if record.seen_in_manifest {
            self.candidate(
                &history,
                &LinePattern::manifest_entry(record.distribution_name()),
                CandidateSource::Requirements,
            )
        } else {
            None
        };

        let chosen = match (import_candidate, requirements_candidate) {
            (None, None) => return Ok(PackageOutcome::Skipped(SkipReason::NoHistory)),
            (Some(only), None) | (None, Some(only)) => only,
            (Some(import), Some(requirements)) if import.version == requirements.version => import,
            (Some(import), Some(requirements)) => {
                match self.arbitrate(record, import, requirements)? {
                    Some(choice) => choice,
                    None => return Ok(PackageOutcome::Skipped(SkipReason::PromptCancelled)),
                }
            }
        };
        Ok(PackageOutcome::Resolved {
            version: chosen.version,
            source: chosen.source,
            date: chosen.date,
        })
    }

    /// Version current when a line matching `pattern` entered the history.
    fn candidate(
        &self,
        history: &ReleaseHistory,
        pattern: &LinePattern,
        source: CandidateSource,
    ) -> Option<Candidate> {
        let introduced = match self.miner.introduced_at(pattern, self.options.occurrence) {
            Ok(found) => found?,
            Err(err) => {
                tracing::warn!(?pattern, error = %err, "history lookup failed");
                return None;
            }
        };
        let version = history.version_at(introduced)?;
        tracing::debug!(?pattern, %version, date = %introduced.date(), "candidate found");
        Some(Candidate {
            source,
            version: version.to_string(),
            date: introduced.date(),
        })
    }

    fn arbitrate(
        &self,
        record: &PackageRecord,
        import: Candidate,
        requirements: Candidate,
    ) -> Result<Option<Candidate>> {
        let message = format!(
            "Choose guessing strategy for package '{}'",
            record.distribution_name()
        );
        let options = [&import, &requirements].map(|candidate| {
            format!(
                "{:<width$} (Version {} / {})",
                candidate.source.describe(),
                candidate.version,
                candidate.date,
                width = STRATEGY_LABEL_WIDTH
            )
        });
        Ok(match self.prompter.choose(&message, &options)? {
            Some(0) => Some(import),
            Some(1) => Some(requirements),
            _ => None,
        })
    }
}

fn log_outcome(package: &str, outcome: &PackageOutcome) {
    match outcome {
        PackageOutcome::Pinned { version } => {
            tracing::info!(package, %version, "version pinned in requirements file");
        }
        PackageOutcome::Resolved {
            version,
            source,
            date,
        } => tracing::info!(
            package,
            %version,
            %date,
            source = source.as_str(),
            "version attributed"
        ),
        PackageOutcome::Skipped(reason) => {
            tracing::warn!(package, reason = reason.as_str(), "{}", reason.describe());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::{BTreeSet, HashMap};

    use guessreq_domain::{Manifest, NameMapping, ReleaseEntry};
    use time::macros::{date, datetime};
    use time::OffsetDateTime;

    use super::*;
    use crate::core::guess::GuessRequest;
    use crate::core::tooling::errors::RegistryError;
    use crate::history::Occurrence;

    #[derive(Default)]
    struct FakeRegistry {
        histories: HashMap<String, ReleaseHistory>,
        calls: RefCell<Vec<String>>,
        fail: bool,
    }

    impl FakeRegistry {
        fn with(mut self, name: &str, releases: &[(&str, OffsetDateTime)]) -> Self {
            let entries = releases
                .iter()
                .map(|(version, date)| ReleaseEntry::new(*version, *date))
                .collect();
            self.histories
                .insert(name.to_lowercase(), ReleaseHistory::new(entries));
            self
        }
    }

    impl ReleaseHistoryProvider for FakeRegistry {
        fn release_history(
            &self,
            distribution: &str,
            _include_prereleases: bool,
        ) -> Result<Option<ReleaseHistory>, RegistryError> {
            self.calls.borrow_mut().push(distribution.to_string());
            if self.fail {
                return Err(RegistryError::Status {
                    url: format!("http://registry/{distribution}/json"),
                    status: 502,
                });
            }
            Ok(self.histories.get(&distribution.to_lowercase()).cloned())
        }
    }

    #[derive(Default)]
    struct FakeMiner {
        dates: HashMap<LinePattern, OffsetDateTime>,
        calls: Cell<usize>,
    }

    impl FakeMiner {
        fn with(mut self, pattern: LinePattern, date: OffsetDateTime) -> Self {
            self.dates.insert(pattern, date);
            self
        }
    }

    impl CommitDateMiner for FakeMiner {
        fn introduced_at(
            &self,
            pattern: &LinePattern,
            _occurrence: Occurrence,
        ) -> Result<Option<OffsetDateTime>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.dates.get(pattern).copied())
        }
    }

    /// Dates the same pattern differently for earliest and latest lookups.
    struct SplitMiner {
        earliest: OffsetDateTime,
        latest: OffsetDateTime,
    }

    impl CommitDateMiner for SplitMiner {
        fn introduced_at(
            &self,
            _pattern: &LinePattern,
            occurrence: Occurrence,
        ) -> Result<Option<OffsetDateTime>> {
            Ok(Some(match occurrence {
                Occurrence::Earliest => self.earliest,
                Occurrence::Latest => self.latest,
            }))
        }
    }

    struct ScriptedPrompter {
        answer: Option<usize>,
        asked: RefCell<Vec<(String, Vec<String>)>>,
    }

    impl ScriptedPrompter {
        fn answering(answer: Option<usize>) -> Self {
            Self {
                answer,
                asked: RefCell::new(Vec::new()),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn choose(&self, message: &str, options: &[String]) -> Result<Option<usize>> {
            self.asked
                .borrow_mut()
                .push((message.to_string(), options.to_vec()));
            Ok(self.answer)
        }

        fn confirm(&self, _message: &str) -> Result<bool> {
            Ok(false)
        }
    }

    fn flask_releases() -> [(&'static str, OffsetDateTime); 2] {
        [
            ("1.0", datetime!(2019-06-01 0:00 UTC)),
            ("1.1", datetime!(2020-03-01 0:00 UTC)),
        ]
    }

    fn table(manifest: &str, imports: &[&str]) -> PackageTable {
        let imports: BTreeSet<String> = imports.iter().map(|name| (*name).to_string()).collect();
        PackageTable::build(&Manifest::parse(manifest), &imports, &NameMapping::default())
    }

    fn run(
        registry: &FakeRegistry,
        miner: &FakeMiner,
        prompter: &ScriptedPrompter,
        options: GuessOptions,
        table: &PackageTable,
    ) -> GuessReport {
        Guesser::new(registry, miner, prompter, options)
            .run(table)
            .expect("guess run")
    }

    fn outcome<'r>(report: &'r GuessReport, name: &str) -> &'r PackageOutcome {
        &report
            .packages
            .iter()
            .find(|package| package.name == name)
            .expect("package reported")
            .outcome
    }

    #[test]
    fn import_date_selects_the_release_current_at_that_time() {
        let registry = FakeRegistry::default().with("flask", &flask_releases());
        let miner = FakeMiner::default()
            .with(LinePattern::import("flask"), datetime!(2020-01-15 10:00 UTC));
        let prompter = ScriptedPrompter::answering(None);

        let report = run(
            &registry,
            &miner,
            &prompter,
            GuessOptions::default(),
            &table("flask\n", &["flask"]),
        );

        assert_eq!(
            outcome(&report, "flask"),
            &PackageOutcome::Resolved {
                version: "1.0".to_string(),
                source: CandidateSource::Import,
                date: date!(2020 - 01 - 15),
            }
        );
        assert_eq!(report.resolved()[0].version, "1.0");
        assert!(prompter.asked.borrow().is_empty());
    }

    #[test]
    fn pinned_packages_touch_neither_registry_nor_history() {
        let registry = FakeRegistry::default();
        let miner = FakeMiner::default();
        let prompter = ScriptedPrompter::answering(None);

        let report = run(
            &registry,
            &miner,
            &prompter,
            GuessOptions::default(),
            &table("requests==2.3.0\n", &["requests"]),
        );

        assert_eq!(
            outcome(&report, "requests"),
            &PackageOutcome::Pinned {
                version: "2.3.0".to_string()
            }
        );
        assert!(registry.calls.borrow().is_empty());
        assert_eq!(miner.calls.get(), 0);
    }

    #[test]
    fn unknown_packages_are_skipped_without_aborting_the_batch() {
        let registry = FakeRegistry::default().with("flask", &flask_releases());
        let miner = FakeMiner::default()
            .with(LinePattern::import("flask"), datetime!(2020-04-01 0:00 UTC))
            .with(LinePattern::import("internal_tool"), datetime!(2020-04-01 0:00 UTC));
        let prompter = ScriptedPrompter::answering(None);

        let report = run(
            &registry,
            &miner,
            &prompter,
            GuessOptions::default(),
            &table("", &["flask", "internal_tool"]),
        );

        assert_eq!(
            outcome(&report, "internal_tool"),
            &PackageOutcome::Skipped(SkipReason::NoRegistryMatch)
        );
        let resolved = report.resolved();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name, "flask");
        assert_eq!(resolved[0].version, "1.1");
    }

    #[test]
    fn matching_candidates_never_prompt() {
        let registry = FakeRegistry::default().with("flask", &flask_releases());
        let miner = FakeMiner::default()
            .with(LinePattern::import("flask"), datetime!(2019-08-01 0:00 UTC))
            .with(
                LinePattern::manifest_entry("flask"),
                datetime!(2019-09-01 0:00 UTC),
            );
        let prompter = ScriptedPrompter::answering(Some(1));

        let report = run(
            &registry,
            &miner,
            &prompter,
            GuessOptions::default(),
            &table("flask\n", &["flask"]),
        );

        assert!(prompter.asked.borrow().is_empty());
        assert!(matches!(
            outcome(&report, "flask"),
            PackageOutcome::Resolved { version, source: CandidateSource::Import, .. } if version == "1.0"
        ));
    }

    #[test]
    fn differing_candidates_are_arbitrated_by_the_user() {
        let registry = FakeRegistry::default().with("flask", &flask_releases());
        let miner = FakeMiner::default()
            .with(LinePattern::import("flask"), datetime!(2019-08-01 0:00 UTC))
            .with(
                LinePattern::manifest_entry("flask"),
                datetime!(2020-05-01 0:00 UTC),
            );
        let prompter = ScriptedPrompter::answering(Some(1));

        let report = run(
            &registry,
            &miner,
            &prompter,
            GuessOptions::default(),
            &table("flask\n", &["flask"]),
        );

        assert_eq!(
            outcome(&report, "flask"),
            &PackageOutcome::Resolved {
                version: "1.1".to_string(),
                source: CandidateSource::Requirements,
                date: date!(2020 - 05 - 01),
            }
        );
        let asked = prompter.asked.borrow();
        let (message, options) = &asked[0];
        assert_eq!(message, "Choose guessing strategy for package 'flask'");
        assert!(options[0].starts_with("First time the package was imported"));
        assert!(options[0].ends_with("(Version 1.0 / 2019-08-01)"));
        assert!(options[1].ends_with("(Version 1.1 / 2020-05-01)"));
    }

    #[test]
    fn cancelled_prompt_skips_the_package() {
        let registry = FakeRegistry::default().with("flask", &flask_releases());
        let miner = FakeMiner::default()
            .with(LinePattern::import("flask"), datetime!(2019-08-01 0:00 UTC))
            .with(
                LinePattern::manifest_entry("flask"),
                datetime!(2020-05-01 0:00 UTC),
            );
        let prompter = ScriptedPrompter::answering(None);

        let report = run(
            &registry,
            &miner,
            &prompter,
            GuessOptions::default(),
            &table("flask\n", &["flask"]),
        );

        assert_eq!(
            outcome(&report, "flask"),
            &PackageOutcome::Skipped(SkipReason::PromptCancelled)
        );
        assert!(report.resolved().is_empty());
    }

    #[test]
    fn packages_never_imported_are_unused_unless_kept() {
        let registry = FakeRegistry::default().with("flask", &flask_releases());
        let miner = FakeMiner::default().with(
            LinePattern::manifest_entry("flask"),
            datetime!(2020-05-01 0:00 UTC),
        );
        let prompter = ScriptedPrompter::answering(None);
        let packages = table("flask\n", &[]);

        let dropped = run(&registry, &miner, &prompter, GuessOptions::default(), &packages);
        assert_eq!(
            outcome(&dropped, "flask"),
            &PackageOutcome::Skipped(SkipReason::Unused)
        );

        let kept = run(
            &registry,
            &miner,
            &prompter,
            GuessOptions {
                keep_unused_packages: true,
                ..GuessOptions::default()
            },
            &packages,
        );
        assert!(matches!(
            outcome(&kept, "flask"),
            PackageOutcome::Resolved { version, source: CandidateSource::Requirements, .. } if version == "1.1"
        ));
    }

    #[test]
    fn kept_package_without_any_history_is_skipped() {
        let registry = FakeRegistry::default().with("flask", &flask_releases());
        let miner = FakeMiner::default();
        let prompter = ScriptedPrompter::answering(None);

        let report = run(
            &registry,
            &miner,
            &prompter,
            GuessOptions {
                keep_unused_packages: true,
                ..GuessOptions::default()
            },
            &table("flask\n", &[]),
        );
        assert_eq!(
            outcome(&report, "flask"),
            &PackageOutcome::Skipped(SkipReason::NoHistory)
        );
    }

    #[test]
    fn registry_outage_aborts_the_run() {
        let registry = FakeRegistry {
            fail: true,
            ..FakeRegistry::default()
        };
        let miner = FakeMiner::default();
        let prompter = ScriptedPrompter::answering(None);

        let err = Guesser::new(&registry, &miner, &prompter, GuessOptions::default())
            .run(&table("", &["flask"]))
            .expect_err("registry failure is fatal");
        assert!(matches!(
            err.downcast_ref::<GuessError>(),
            Some(GuessError::Registry(_))
        ));
    }

    #[test]
    fn latest_addition_request_reaches_the_miner() {
        let registry = FakeRegistry::default().with("flask", &flask_releases());
        let miner = SplitMiner {
            earliest: datetime!(2019-08-01 0:00 UTC),
            latest: datetime!(2020-05-01 0:00 UTC),
        };
        let prompter = ScriptedPrompter::answering(None);
        let packages = table("", &["flask"]);
        let guess = |request: &GuessRequest| {
            Guesser::new(&registry, &miner, &prompter, GuessOptions::from(request))
                .run(&packages)
                .expect("guess run")
        };

        let first = guess(&GuessRequest::default());
        assert!(matches!(
            outcome(&first, "flask"),
            PackageOutcome::Resolved { version, .. } if version == "1.0"
        ));

        let latest = guess(&GuessRequest {
            latest_addition: true,
            ..GuessRequest::default()
        });
        assert_eq!(
            outcome(&latest, "flask"),
            &PackageOutcome::Resolved {
                version: "1.1".to_string(),
                source: CandidateSource::Import,
                date: date!(2020 - 05 - 01),
            }
        );
    }
}
