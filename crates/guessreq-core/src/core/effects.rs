use std::path::Path;
use std::rc::Rc;

use anyhow::Result;

use crate::config::Config;
use crate::core::tooling::errors::GuessError;
use crate::history::{CommitDateMiner, GitMiner};
use crate::mapping::{CachedMappingSource, MappingSource};
use crate::net::build_http_client;
use crate::prompt::Prompter;
use crate::registry::{PypiRegistry, ReleaseHistoryProvider};

/// Everything a guess run needs from the outside world.
pub trait Effects {
    fn registry(&self) -> &dyn ReleaseHistoryProvider;
    fn mapping(&self) -> &dyn MappingSource;
    fn prompter(&self) -> &dyn Prompter;
    /// Open the version history containing `project_root`.
    ///
    /// # Errors
    /// Returns [`GuessError::NotARepository`] outside a git checkout.
    fn open_history(
        &self,
        project_root: &Path,
        manifest: &Path,
    ) -> Result<Box<dyn CommitDateMiner>, GuessError>;
}

pub type SharedEffects = Rc<dyn Effects>;

pub struct SystemEffects {
    registry: PypiRegistry,
    mapping: CachedMappingSource,
    prompter: Rc<dyn Prompter>,
}

impl SystemEffects {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config, prompter: Rc<dyn Prompter>) -> Result<Self> {
        let client = build_http_client(config.network())?;
        let registry = PypiRegistry::with_client(client.clone(), config.network().index_url.clone());
        let mapping = CachedMappingSource::new(config.mapping().clone(), client, prompter.clone());
        Ok(Self {
            registry,
            mapping,
            prompter,
        })
    }
}

impl Effects for SystemEffects {
    fn registry(&self) -> &dyn ReleaseHistoryProvider {
        &self.registry
    }

    fn mapping(&self) -> &dyn MappingSource {
        &self.mapping
    }

    fn prompter(&self) -> &dyn Prompter {
        self.prompter.as_ref()
    }

    fn open_history(
        &self,
        project_root: &Path,
        manifest: &Path,
    ) -> Result<Box<dyn CommitDateMiner>, GuessError> {
        Ok(Box::new(GitMiner::discover(project_root, manifest)?))
    }
}
