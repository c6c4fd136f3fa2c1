use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};

use crate::net::keep_proxies;

pub(crate) const DEFAULT_INDEX_URL: &str = "https://pypi.org/pypi";
pub(crate) const DEFAULT_MAPPING_URL: &str = "https://raw.githubusercontent.com/bndr/pipreqs/90102acdbb23c09574d27df8bd1f568d34e0cfd3/pipreqs/mapping";
pub(crate) const DEFAULT_STDLIB_URL: &str = "https://raw.githubusercontent.com/bndr/pipreqs/90102acdbb23c09574d27df8bd1f568d34e0cfd3/pipreqs/stdlib";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Snapshot built from explicit pairs instead of the process environment.
    pub fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) network: NetworkConfig,
    pub(crate) mapping: MappingConfig,
}

impl Config {
    /// Builds a configuration snapshot from the current process environment.
    ///
    /// # Errors
    /// Returns an error if the cache directory cannot be determined or a
    /// numeric setting does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_snapshot(&EnvSnapshot::capture())
    }

    pub fn from_snapshot(snapshot: &EnvSnapshot) -> anyhow::Result<Self> {
        let timeout_secs = match snapshot.var("GUESSREQ_HTTP_TIMEOUT") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("GUESSREQ_HTTP_TIMEOUT must be seconds, got `{raw}`"))?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };
        let cache_dir = match snapshot.var("GUESSREQ_CACHE_DIR") {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => dirs_next::cache_dir()
                .map(|base| base.join("guessreq"))
                .ok_or_else(|| anyhow!("unable to determine a cache directory; set GUESSREQ_CACHE_DIR"))?,
        };
        Ok(Self {
            network: NetworkConfig {
                index_url: snapshot
                    .var("GUESSREQ_INDEX_URL")
                    .unwrap_or(DEFAULT_INDEX_URL)
                    .trim_end_matches('/')
                    .to_string(),
                timeout: Duration::from_secs(timeout_secs),
                keep_proxies: keep_proxies(snapshot),
            },
            mapping: MappingConfig {
                cache_dir,
                mapping_url: snapshot
                    .var("GUESSREQ_MAPPING_URL")
                    .unwrap_or(DEFAULT_MAPPING_URL)
                    .to_string(),
                stdlib_url: snapshot
                    .var("GUESSREQ_STDLIB_URL")
                    .unwrap_or(DEFAULT_STDLIB_URL)
                    .to_string(),
            },
        })
    }

    #[must_use]
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    #[must_use]
    pub fn mapping(&self) -> &MappingConfig {
        &self.mapping
    }
}

#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub index_url: String,
    pub timeout: Duration,
    pub keep_proxies: bool,
}

#[derive(Debug, Clone)]
pub struct MappingConfig {
    pub cache_dir: PathBuf,
    pub mapping_url: String,
    pub stdlib_url: String,
}
