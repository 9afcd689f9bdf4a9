//! Component catalog trait and the in-memory implementation.
//!
//! The `ComponentCatalog` trait abstracts over where component contracts come
//! from. `MemoryCatalog` holds them in maps and is populated either directly
//! or from TOML catalog documents:
//!
//! ```toml
//! [[component]]
//! name = "iob_reg"
//! version = "V0.10"
//! description = "Register with reset"
//!
//! [[component.parameters]]
//! name = "DATA_W"
//! default = 1
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::component::{parse_requirement, resolve_best, ComponentSpec, Version};
use crate::error::{RegistryError, Result};

/// Read access to component contracts.
///
/// Implementations must be safe for concurrent reads; several peripherals may
/// be assembled against one catalog in parallel.
pub trait ComponentCatalog: Send + Sync {
    /// Available versions of a component, ascending. Empty if unknown.
    fn list_versions(&self, name: &str) -> Result<Vec<Version>>;

    /// Fetch one component version.
    fn fetch(&self, name: &str, version: &Version) -> Result<&ComponentSpec>;

    /// All component names, sorted.
    fn component_names(&self) -> Vec<&str>;
}

/// Pick the highest version of `name` matching `requirement` (any version if `None`).
pub fn fetch_best<'a>(
    catalog: &'a dyn ComponentCatalog,
    name: &str,
    requirement: Option<&str>,
) -> Result<&'a ComponentSpec> {
    let available = catalog.list_versions(name)?;
    if available.is_empty() {
        return Err(RegistryError::ComponentNotFound {
            name: name.to_string(),
        });
    }

    let best = match requirement {
        None => available.iter().max().cloned(),
        Some(req_str) => {
            let req = parse_requirement(req_str).map_err(|_| RegistryError::NoMatchingVersion {
                name: name.to_string(),
                requirement: req_str.to_string(),
            })?;
            resolve_best(&available, &req)
        }
    };
    let version = best.ok_or_else(|| RegistryError::NoMatchingVersion {
        name: name.to_string(),
        requirement: requirement.unwrap_or("*").to_string(),
    })?;
    catalog.fetch(name, &version)
}

/// A TOML catalog document: a list of `[[component]]` tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlCatalog {
    #[serde(default, rename = "component")]
    pub components: Vec<ComponentSpec>,
}

impl TomlCatalog {
    /// Parse a catalog document from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        let doc: TomlCatalog = toml::from_str(s)?;
        for spec in &doc.components {
            if spec.name.is_empty() {
                return Err(RegistryError::InvalidCatalog {
                    detail: "component with empty name".to_string(),
                });
            }
            spec.semver()?;
        }
        Ok(doc)
    }

    /// Read and parse a catalog file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }
}

/// Catalog held in memory, keyed by name then version.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    components: BTreeMap<String, BTreeMap<Version, ComponentSpec>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one component version.
    pub fn insert(&mut self, spec: ComponentSpec) -> Result<()> {
        let version = spec.semver()?;
        let versions = self.components.entry(spec.name.clone()).or_default();
        if versions.contains_key(&version) {
            return Err(RegistryError::DuplicateComponent {
                name: spec.name,
                version: version.to_string(),
            });
        }
        versions.insert(version, spec);
        Ok(())
    }

    /// Register every component of a parsed document.
    pub fn extend(&mut self, doc: TomlCatalog) -> Result<()> {
        for spec in doc.components {
            self.insert(spec)?;
        }
        Ok(())
    }

    /// Build a catalog from one TOML document.
    pub fn from_toml(s: &str) -> Result<Self> {
        let mut catalog = Self::new();
        catalog.extend(TomlCatalog::parse(s)?)?;
        Ok(catalog)
    }

    /// Add the components of a catalog file.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let doc = TomlCatalog::load(path)?;
        log::debug!("catalog {}: {} components", path.display(), doc.components.len());
        self.extend(doc)
    }

    /// Number of component versions held.
    pub fn len(&self) -> usize {
        self.components.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Latest version of every component, sorted by name.
    pub fn latest(&self) -> impl Iterator<Item = &ComponentSpec> {
        self.components
            .values()
            .filter_map(|versions| versions.values().next_back())
    }
}

impl ComponentCatalog for MemoryCatalog {
    fn list_versions(&self, name: &str) -> Result<Vec<Version>> {
        Ok(self
            .components
            .get(name)
            .map(|versions| versions.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn fetch(&self, name: &str, version: &Version) -> Result<&ComponentSpec> {
        self.components
            .get(name)
            .and_then(|versions| versions.get(version))
            .ok_or_else(|| RegistryError::NoMatchingVersion {
                name: name.to_string(),
                requirement: format!("={version}"),
            })
    }

    fn component_names(&self) -> Vec<&str> {
        self.components.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
[[component]]
name = "iob_reg"
version = "V0.10"
description = "Register with reset"

[[component.parameters]]
name = "DATA_W"
kind = "P"
default = 1
min = "NA"
max = "NA"

[[component]]
name = "iob_reg"
version = "V0.11"

[[component]]
name = "iob_mux"
version = "V0.10"
"#;

    #[test]
    fn parse_catalog_document() {
        let catalog = MemoryCatalog::from_toml(DOC).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.component_names(), vec!["iob_mux", "iob_reg"]);
        let versions = catalog.list_versions("iob_reg").unwrap();
        assert_eq!(versions, vec![Version::new(0, 10, 0), Version::new(0, 11, 0)]);
    }

    #[test]
    fn fetch_best_prefers_highest_match() {
        let catalog = MemoryCatalog::from_toml(DOC).unwrap();
        assert_eq!(fetch_best(&catalog, "iob_reg", None).unwrap().version, "V0.11");
        let pinned = fetch_best(&catalog, "iob_reg", Some("=0.10")).unwrap();
        assert_eq!(pinned.version, "V0.10");
        assert!(pinned.parameter("DATA_W").is_some());
    }

    #[test]
    fn unknown_component() {
        let catalog = MemoryCatalog::from_toml(DOC).unwrap();
        assert!(matches!(
            fetch_best(&catalog, "iob_uart", None),
            Err(RegistryError::ComponentNotFound { .. })
        ));
        assert!(matches!(
            fetch_best(&catalog, "iob_reg", Some(">=2")),
            Err(RegistryError::NoMatchingVersion { .. })
        ));
    }

    #[test]
    fn duplicate_version_rejected() {
        let mut catalog = MemoryCatalog::new();
        catalog.insert(ComponentSpec::new("iob_reg", "V0.10")).unwrap();
        let err = catalog.insert(ComponentSpec::new("iob_reg", "0.10.0")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateComponent { .. }));
    }

    #[test]
    fn invalid_version_rejected_at_parse() {
        let doc = "[[component]]\nname = \"x\"\nversion = \"latest\"\n";
        assert!(matches!(
            TomlCatalog::parse(doc),
            Err(RegistryError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extra.toml");
        std::fs::write(&path, DOC).unwrap();
        let mut catalog = MemoryCatalog::new();
        catalog.load_file(&path).unwrap();
        assert_eq!(catalog.latest().count(), 2);

        let missing = catalog.load_file(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(RegistryError::Io { .. })));
    }
}
