use std::path::PathBuf;

use thiserror::Error;

/// Failures of the registry metadata endpoint. An unknown package is not an
/// error; these all abort the run.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to query {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("registry returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("download of the name mapping files was declined")]
    Declined,
    #[error("could not ask for consent to download the name mapping files: {reason}")]
    Prompt { reason: String },
    #[error("failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to access mapping cache {}: {source}", path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Conditions that stop a run before or during guessing.
#[derive(Debug, Error)]
pub enum GuessError {
    #[error("{} is not inside a git repository", path.display())]
    NotARepository { path: PathBuf },
    #[error("name mapping files are unavailable: {0}")]
    MappingUnavailable(#[source] MappingError),
    #[error("name mapping files are required; download was declined")]
    DownloadDeclined,
    #[error("couldn't find any import statement under {}", root.display())]
    NoImportsFound { root: PathBuf },
    #[error("registry is unreachable: {0}")]
    Registry(#[from] RegistryError),
}

impl From<MappingError> for GuessError {
    fn from(err: MappingError) -> Self {
        match err {
            MappingError::Declined => Self::DownloadDeclined,
            other => Self::MappingUnavailable(other),
        }
    }
}

impl GuessError {
    /// The user said no; the run stops without failing.
    #[must_use]
    pub fn is_declined(&self) -> bool {
        matches!(self, Self::DownloadDeclined)
    }

    /// Short hint shown under the error message.
    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NotARepository { .. } => {
                Some("Run guessreq from inside the project's git checkout, or pass --project.")
            }
            Self::MappingUnavailable(MappingError::Prompt { .. }) => {
                Some("Pass --yes to accept the mapping download without a prompt.")
            }
            Self::MappingUnavailable(_) => Some(
                "Internet access is required on first run to fetch the pipreqs mapping files.",
            ),
            Self::DownloadDeclined => {
                Some("Re-run and accept the download, or pass --yes to accept it up front.")
            }
            Self::NoImportsFound { .. } => {
                Some("Check that --project points at the project root.")
            }
            Self::Registry(_) => {
                Some("Internet access is required to fetch release history; retry once online.")
            }
        }
    }
}
