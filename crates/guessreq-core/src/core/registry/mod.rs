//! Release history lookups against the PyPI JSON API.

mod pypi;

use guessreq_domain::ReleaseHistory;
use reqwest::{blocking::Client, StatusCode};

use crate::config::NetworkConfig;
use crate::core::tooling::errors::RegistryError;
use crate::net::build_http_client;

use pypi::{build_release_history, ProjectResponse};

pub trait ReleaseHistoryProvider {
    /// Published releases of `distribution`, newest first.
    ///
    /// `Ok(None)` means the registry does not know the package.
    fn release_history(
        &self,
        distribution: &str,
        include_prereleases: bool,
    ) -> Result<Option<ReleaseHistory>, RegistryError>;
}

pub struct PypiRegistry {
    client: Client,
    index_url: String,
}

impl PypiRegistry {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(network: &NetworkConfig) -> anyhow::Result<Self> {
        Ok(Self::with_client(
            build_http_client(network)?,
            network.index_url.clone(),
        ))
    }

    pub fn with_client(client: Client, index_url: impl Into<String>) -> Self {
        Self {
            client,
            index_url: index_url.into(),
        }
    }

    fn project_url(&self, distribution: &str) -> String {
        format!("{}/{distribution}/json", self.index_url)
    }
}

impl ReleaseHistoryProvider for PypiRegistry {
    fn release_history(
        &self,
        distribution: &str,
        include_prereleases: bool,
    ) -> Result<Option<ReleaseHistory>, RegistryError> {
        let url = self.project_url(distribution);
        tracing::debug!(%url, "fetching release history");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|source| RegistryError::Transport {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(RegistryError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let project = response
            .json::<ProjectResponse>()
            .map_err(|source| RegistryError::Decode {
                url: url.clone(),
                source,
            })?;
        let history = build_release_history(&project, include_prereleases);
        tracing::debug!(distribution, releases = history.len(), "release history loaded");
        Ok(Some(history))
    }
}
