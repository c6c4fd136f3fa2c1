//! Import-name mapping and stdlib list, cached on disk after one download.

mod cache;

use guessreq_domain::{NameMapping, StdlibSet};

use crate::core::tooling::errors::MappingError;

pub use cache::CachedMappingSource;

#[derive(Debug, Clone, Default)]
pub struct MappingAssets {
    pub mapping: NameMapping,
    pub stdlib: StdlibSet,
}

pub trait MappingSource {
    /// Cached assets, downloading them first when the cache is empty.
    fn load(&self) -> Result<MappingAssets, MappingError>;

    /// Download fresh assets and replace the cache.
    fn refresh(&self) -> Result<MappingAssets, MappingError>;
}
