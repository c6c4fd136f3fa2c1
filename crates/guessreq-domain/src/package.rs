use std::collections::{BTreeMap, BTreeSet};

use crate::manifest::Manifest;
use crate::mapping::{NameMapping, PackageIdentity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub key: String,
    pub identity: PackageIdentity,
    pub pinned_version: Option<String>,
    pub seen_in_manifest: bool,
}

impl PackageRecord {
    pub fn distribution_name(&self) -> &str {
        &self.identity.distribution_name
    }

    pub fn import_name(&self) -> &str {
        &self.identity.import_name
    }
}

/// Every package discovered for one run, keyed by lowercase distribution name.
#[derive(Debug, Clone, Default)]
pub struct PackageTable {
    records: BTreeMap<String, PackageRecord>,
}

impl PackageTable {
    /// Union of manifest entries and scanned imports.
    ///
    /// Manifest entries win when an import maps onto the same distribution, so
    /// `import yaml` and a `PyYAML` line become a single record.
    pub fn build(manifest: &Manifest, imports: &BTreeSet<String>, mapping: &NameMapping) -> Self {
        let mut records = BTreeMap::new();
        for (_, entry) in manifest.iter() {
            let identity = PackageIdentity::from_distribution(&entry.name, mapping);
            let key = identity.key();
            records.insert(
                key.clone(),
                PackageRecord {
                    key,
                    identity,
                    pinned_version: entry.version.clone(),
                    seen_in_manifest: true,
                },
            );
        }
        for import in imports {
            let identity = PackageIdentity::from_import(import, mapping);
            let key = identity.key();
            records.entry(key.clone()).or_insert(PackageRecord {
                key,
                identity,
                pinned_version: None,
                seen_in_manifest: false,
            });
        }
        Self { records }
    }

    pub fn get(&self, key: &str) -> Option<&PackageRecord> {
        self.records.get(&key.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: String,
}
