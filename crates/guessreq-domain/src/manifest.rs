use std::{fs, io, path::Path};

use anyhow::{Context, Result};
use indexmap::IndexMap;

use crate::package::ResolvedPackage;

/// Version operators recognised in a requirements line, longest first so
/// `<=` is never read as `<` followed by `=`.
const OPERATORS: [&str; 5] = ["==", "<=", ">=", "<", ">"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Name as spelled in the file.
    pub name: String,
    pub version: Option<String>,
}

/// Requirements file contents keyed by lowercase package name, in file order.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: IndexMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn parse(contents: &str) -> Self {
        let mut entries = IndexMap::new();
        for line in contents.lines() {
            let Some((name, version)) = split_requirement_line(line) else {
                continue;
            };
            entries.insert(
                name.to_lowercase(),
                ManifestEntry {
                    name: name.to_string(),
                    version: version.map(ToString::to_string),
                },
            );
        }
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&ManifestEntry> {
        self.entries.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ManifestEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read a requirements file. A missing file is an empty manifest.
pub fn read_manifest(path: &Path) -> Result<Manifest> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Manifest::parse(&contents)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no manifest found");
            Ok(Manifest::default())
        }
        Err(err) => Err(err).with_context(|| format!("reading {}", path.display())),
    }
}

/// Split a requirements line into its name and the version after the last
/// operator. Returns `None` for blank and comment-only lines.
///
/// `flask>=1.0,<2` yields `("flask", Some("2"))`; only the last token is kept.
pub fn split_requirement_line(line: &str) -> Option<(&str, Option<&str>)> {
    let spec = match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
    .trim();
    if spec.is_empty() {
        return None;
    }

    let mut first: Option<usize> = None;
    let mut last_end: Option<usize> = None;
    let bytes = spec.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() {
        match OPERATORS
            .iter()
            .find(|op| bytes[idx..].starts_with(op.as_bytes()))
        {
            Some(op) => {
                first.get_or_insert(idx);
                idx += op.len();
                last_end = Some(idx);
            }
            None => idx += 1,
        }
    }

    let name = spec[..first.unwrap_or(spec.len())].trim();
    if name.is_empty() {
        return None;
    }
    let version = last_end
        .map(|end| spec[end..].trim())
        .filter(|version| !version.is_empty());
    Some((name, version))
}

/// Render `name==version` lines in plain lexicographic order of the name,
/// so `Zope` sorts before `attrs`.
pub fn render_manifest(packages: &[ResolvedPackage]) -> String {
    let mut sorted: Vec<&ResolvedPackage> = packages.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted
        .iter()
        .map(|pkg| format!("{}=={}\n", pkg.name, pkg.version))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(name: &str, version: &str) -> ResolvedPackage {
        ResolvedPackage {
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    #[test]
    fn parses_pinned_ranged_and_bare_lines() {
        let manifest = Manifest::parse("name==1.2.3\nname2>=0.1\nname3\n");
        assert_eq!(manifest.len(), 3);
        assert_eq!(
            manifest.get("name").and_then(|e| e.version.as_deref()),
            Some("1.2.3")
        );
        assert_eq!(
            manifest.get("name2").and_then(|e| e.version.as_deref()),
            Some("0.1")
        );
        assert_eq!(manifest.get("name3").map(|e| e.version.clone()), Some(None));
    }

    #[test]
    fn keys_are_case_insensitive_but_spelling_is_kept() {
        let manifest = Manifest::parse("Flask==2.0\n");
        let entry = manifest.get("FLASK").expect("entry");
        assert_eq!(entry.name, "Flask");
        assert!(manifest.contains("flask"));
    }

    #[test]
    fn last_operator_token_wins() {
        assert_eq!(
            split_requirement_line("requests>=2.0,<3"),
            Some(("requests", Some("3")))
        );
        assert_eq!(
            split_requirement_line("numpy <= 1.19 "),
            Some(("numpy", Some("1.19")))
        );
    }

    #[test]
    fn blank_and_comment_lines_are_ignored() {
        assert_eq!(split_requirement_line("   "), None);
        assert_eq!(split_requirement_line("# pinned by hand"), None);
        assert_eq!(
            split_requirement_line("six==1.16  # legacy"),
            Some(("six", Some("1.16")))
        );
        let manifest = Manifest::parse("\n# comment\n\nsix\n");
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn dangling_operator_leaves_version_unresolved() {
        assert_eq!(split_requirement_line("flask=="), Some(("flask", None)));
    }

    #[test]
    fn missing_file_is_an_empty_manifest() {
        let temp = tempfile::tempdir().expect("tempdir");
        let manifest = read_manifest(&temp.path().join("requirements.txt")).expect("read");
        assert!(manifest.is_empty());
    }

    #[test]
    fn rendered_output_parses_back_to_the_same_pins() {
        let packages = vec![resolved("requests", "2.25.1"), resolved("Flask", "1.0")];
        let rendered = render_manifest(&packages);
        assert_eq!(rendered, "Flask==1.0\nrequests==2.25.1\n");

        let reparsed = Manifest::parse(&rendered);
        for pkg in &packages {
            let entry = reparsed.get(&pkg.name).expect("entry");
            assert_eq!(entry.version.as_deref(), Some(pkg.version.as_str()));
        }
    }

    #[test]
    fn names_are_ordered_by_plain_comparison() {
        let packages = vec![
            resolved("attrs", "19.1.0"),
            resolved("Zope", "4.0"),
            resolved("flask", "1.0"),
        ];
        assert_eq!(
            render_manifest(&packages),
            "Zope==4.0\nattrs==19.1.0\nflask==1.0\n"
        );
    }
}
