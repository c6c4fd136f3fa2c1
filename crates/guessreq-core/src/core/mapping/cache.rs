use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use guessreq_domain::{NameMapping, StdlibSet};
use reqwest::blocking::{Client, Response};

use super::{MappingAssets, MappingSource};
use crate::config::MappingConfig;
use crate::core::tooling::errors::MappingError;
use crate::prompt::Prompter;

const MAPPING_FILE: &str = "mapping";
const STDLIB_FILE: &str = "stdlib";

/// Mapping files stored under the configured cache directory.
pub struct CachedMappingSource {
    config: MappingConfig,
    client: Client,
    prompter: Rc<dyn Prompter>,
}

impl CachedMappingSource {
    /// `prompter` is asked before the first download.
    pub fn new(config: MappingConfig, client: Client, prompter: Rc<dyn Prompter>) -> Self {
        Self {
            config,
            client,
            prompter,
        }
    }

    fn mapping_path(&self) -> PathBuf {
        self.config.cache_dir.join(MAPPING_FILE)
    }

    fn stdlib_path(&self) -> PathBuf {
        self.config.cache_dir.join(STDLIB_FILE)
    }

    fn download(&self, url: &str) -> Result<String, MappingError> {
        tracing::debug!(%url, "downloading mapping file");
        self.client
            .get(url)
            .send()
            .and_then(Response::error_for_status)
            .and_then(Response::text)
            .map_err(|source| MappingError::Download {
                url: url.to_string(),
                source,
            })
    }
}

impl MappingSource for CachedMappingSource {
    fn load(&self) -> Result<MappingAssets, MappingError> {
        let mapping_path = self.mapping_path();
        let stdlib_path = self.stdlib_path();
        if mapping_path.is_file() && stdlib_path.is_file() {
            tracing::debug!(cache = %self.config.cache_dir.display(), "using cached mapping files");
            return Ok(MappingAssets {
                mapping: NameMapping::parse(&read_cached(&mapping_path)?),
                stdlib: StdlibSet::parse(&read_cached(&stdlib_path)?),
            });
        }

        let message = format!(
            "guessreq maps import names to package names with files from the pipreqs project. \
             Download them to {}?",
            self.config.cache_dir.display()
        );
        let accepted = self
            .prompter
            .confirm(&message)
            .map_err(|err| MappingError::Prompt {
                reason: format!("{err:#}"),
            })?;
        if !accepted {
            return Err(MappingError::Declined);
        }
        self.refresh()
    }

    fn refresh(&self) -> Result<MappingAssets, MappingError> {
        let mapping = self.download(&self.config.mapping_url)?;
        let stdlib = self.download(&self.config.stdlib_url)?;

        fs::create_dir_all(&self.config.cache_dir).map_err(|source| MappingError::Cache {
            path: self.config.cache_dir.clone(),
            source,
        })?;
        write_cached(&self.mapping_path(), &mapping)?;
        write_cached(&self.stdlib_path(), &stdlib)?;
        tracing::info!(cache = %self.config.cache_dir.display(), "mapping files downloaded");

        Ok(MappingAssets {
            mapping: NameMapping::parse(&mapping),
            stdlib: StdlibSet::parse(&stdlib),
        })
    }
}

fn read_cached(path: &Path) -> Result<String, MappingError> {
    let bytes = fs::read(path).map_err(|source| MappingError::Cache {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write through a sibling temp file so readers never see a partial file.
fn write_cached(path: &Path, contents: &str) -> Result<(), MappingError> {
    let staging = path.with_extension("partial");
    fs::write(&staging, contents)
        .and_then(|()| fs::rename(&staging, path))
        .map_err(|source| MappingError::Cache {
            path: path.to_path_buf(),
            source,
        })
}
