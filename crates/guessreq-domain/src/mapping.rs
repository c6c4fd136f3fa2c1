use std::collections::{HashMap, HashSet};

/// Import-name and distribution-name lookups in both directions.
///
/// Keys are lowercase; a missing entry means the two names coincide.
#[derive(Debug, Clone, Default)]
pub struct NameMapping {
    import_to_distribution: HashMap<String, String>,
    distribution_to_import: HashMap<String, String>,
}

impl NameMapping {
    /// Parse the `import:distribution` line format.
    pub fn parse(contents: &str) -> Self {
        let pairs = contents.lines().filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            match line.split_once(':') {
                Some((import, distribution)) => Some((import.trim(), distribution.trim())),
                None => {
                    tracing::debug!(line, "skipping malformed mapping line");
                    None
                }
            }
        });
        Self::from_pairs(pairs)
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut mapping = Self::default();
        for (import, distribution) in pairs {
            mapping
                .import_to_distribution
                .insert(import.to_lowercase(), distribution.to_string());
            mapping
                .distribution_to_import
                .insert(distribution.to_lowercase(), import.to_string());
        }
        mapping
    }

    pub fn distribution_for_import<'a>(&'a self, import: &'a str) -> &'a str {
        self.import_to_distribution
            .get(&import.to_lowercase())
            .map_or(import, String::as_str)
    }

    pub fn import_for_distribution<'a>(&'a self, distribution: &'a str) -> &'a str {
        self.distribution_to_import
            .get(&distribution.to_lowercase())
            .map_or(distribution, String::as_str)
    }

    pub fn len(&self) -> usize {
        self.import_to_distribution.len()
    }

    pub fn is_empty(&self) -> bool {
        self.import_to_distribution.is_empty()
    }
}

/// Module names never treated as third-party packages.
#[derive(Debug, Clone, Default)]
pub struct StdlibSet {
    names: HashSet<String>,
}

impl StdlibSet {
    /// One module name per line.
    pub fn parse(contents: &str) -> Self {
        Self::from_names(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        )
    }

    pub fn from_names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Extend<String> for StdlibSet {
    fn extend<T: IntoIterator<Item = String>>(&mut self, iter: T) {
        self.names.extend(iter);
    }
}

/// Both names of one package, resolved once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageIdentity {
    pub import_name: String,
    pub distribution_name: String,
}

impl PackageIdentity {
    pub fn from_import(import: &str, mapping: &NameMapping) -> Self {
        Self {
            import_name: import.to_string(),
            distribution_name: mapping.distribution_for_import(import).to_string(),
        }
    }

    pub fn from_distribution(distribution: &str, mapping: &NameMapping) -> Self {
        Self {
            import_name: mapping.import_for_distribution(distribution).to_string(),
            distribution_name: distribution.to_string(),
        }
    }

    /// Case-insensitive table key.
    pub fn key(&self) -> String {
        self.distribution_name.to_lowercase()
    }
}
