//! Component catalog and submodule resolution for ipforge.
//!
//! A peripheral names the components it instantiates and the standard bus
//! interfaces it exposes. This crate supplies both lookups:
//!
//! - **Component catalog** — capability contracts (name, version,
//!   parameters, ports), loaded from TOML catalog files
//! - **Interface registry** — canonical signal templates for interface markers
//! - **Resolution** — the deduplicated, purpose-qualified instance list

pub mod catalog;
pub mod component;
pub mod error;
pub mod interface;
pub mod resolution;
pub mod tree;

// Re-exports for convenience.
pub use catalog::{fetch_best, ComponentCatalog, MemoryCatalog, TomlCatalog};
pub use component::{parse_requirement, parse_version, ComponentSpec, Version, VersionReq};
pub use error::{RegistryError, Result};
pub use interface::InterfaceRegistry;
pub use resolution::{resolve, ResolvedInstance, ResolvedInterface, ResolvedSubmodules};
pub use tree::format_tree;
