//! Registry error types.

use std::path::PathBuf;

/// Errors that can occur while loading or querying a component catalog.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Component not known to the catalog.
    #[error("component not found: {name}")]
    ComponentNotFound { name: String },

    /// No published version satisfies the requirement.
    #[error("no version of '{name}' satisfies requirement '{requirement}'")]
    NoMatchingVersion { name: String, requirement: String },

    /// A version string that cannot be read as a (possibly `V`-prefixed) semver.
    #[error("invalid version '{version}' for component '{name}': {source}")]
    InvalidVersion {
        name: String,
        version: String,
        #[source]
        source: semver::Error,
    },

    /// The same component version was registered twice.
    #[error("component '{name}' version {version} registered twice")]
    DuplicateComponent { name: String, version: String },

    /// A catalog document that parses but is not usable.
    #[error("invalid catalog: {detail}")]
    InvalidCatalog { detail: String },

    /// Catalog file could not be read.
    #[error("cannot read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
