#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod imports;
pub mod manifest;
pub mod mapping;
pub mod package;
pub mod releases;

pub use imports::{
    discover_python_files, local_modules, scan_imports, top_level_import, ImportScan,
};
pub use manifest::{read_manifest, render_manifest, split_requirement_line, Manifest, ManifestEntry};
pub use mapping::{NameMapping, PackageIdentity, StdlibSet};
pub use package::{PackageRecord, PackageTable, ResolvedPackage};
pub use releases::{is_prerelease, version_at_date, ReleaseEntry, ReleaseHistory};
