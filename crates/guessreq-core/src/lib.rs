#![deny(clippy::all)]

mod core;

pub(crate) use crate::core::config;
pub(crate) use crate::core::tooling::outcome;
pub(crate) use crate::core::{effects, history, mapping, net, prompt, registry};

pub use crate::core::config::context::CommandContext;
pub use crate::core::config::{Config, EnvSnapshot, MappingConfig, NetworkConfig};
pub use crate::core::effects::{Effects, SharedEffects, SystemEffects};
pub use crate::core::guess::{
    guess_requirements, CandidateSource, GuessOptions, GuessReport, GuessRequest, Guesser,
    PackageOutcome, PackageReport, SkipReason,
};
pub use crate::core::history::{CommitDateMiner, GitMiner, LineKind, LinePattern, Occurrence};
pub use crate::core::mapping::{CachedMappingSource, MappingAssets, MappingSource};
pub use crate::core::prompt::{AutoConfirm, LinePrompter, Prompter, TerminalPrompter};
pub use crate::core::registry::{PypiRegistry, ReleaseHistoryProvider};
pub use crate::core::tooling::errors::{GuessError, MappingError, RegistryError};
pub use crate::core::tooling::outcome::{CommandStatus, ExecutionOutcome};

pub const GUESSREQ_VERSION: &str = env!("CARGO_PKG_VERSION");
