//! Component capability contracts.
//!
//! A component is a reusable hardware module a peripheral instantiates. The
//! catalog only needs its contract: name, version, declared parameters and
//! port groups. IOb-style version strings (`V0.10`) are kept verbatim and
//! read as semver (`0.10.0`) for ordering and requirement matching.

use ipforge_core::param::Parameter;
use ipforge_core::port::PortGroup;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// A parsed semantic version.
pub type Version = semver::Version;

/// A version requirement (range expression).
pub type VersionReq = semver::VersionReq;

/// Capability contract of one component version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSpec {
    pub name: String,
    /// Version as published, e.g. `V0.10` or `1.2.0`.
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub ports: Vec<PortGroup>,
}

impl ComponentSpec {
    pub fn new(name: &str, version: &str) -> Self {
        ComponentSpec {
            name: name.to_string(),
            version: version.to_string(),
            description: String::new(),
            parameters: Vec::new(),
            ports: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_parameter(mut self, param: Parameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_ports(mut self, group: PortGroup) -> Self {
        self.ports.push(group);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// The published version read as semver.
    pub fn semver(&self) -> Result<Version> {
        parse_version(&self.version).map_err(|source| RegistryError::InvalidVersion {
            name: self.name.clone(),
            version: self.version.clone(),
            source,
        })
    }
}

/// Parse a version string, accepting a leading `V` and missing components.
///
/// `V0.10` reads as `0.10.0`, `2` as `2.0.0`.
pub fn parse_version(s: &str) -> std::result::Result<Version, semver::Error> {
    let trimmed = s.trim();
    let bare = trimmed
        .strip_prefix('V')
        .or_else(|| trimmed.strip_prefix('v'))
        .unwrap_or(trimmed);
    let (core, rest) = match bare.find(['-', '+']) {
        Some(i) => bare.split_at(i),
        None => (bare, ""),
    };
    let mut parts = core.split('.').count();
    let mut normalized = core.to_string();
    while parts < 3 {
        normalized.push_str(".0");
        parts += 1;
    }
    normalized.push_str(rest);
    Version::parse(&normalized)
}

/// Parse a version requirement like `^0.10` or `>=1.0.0, <2.0.0`.
pub fn parse_requirement(s: &str) -> std::result::Result<VersionReq, semver::Error> {
    VersionReq::parse(s)
}

/// Find the highest version that satisfies the requirement.
pub fn resolve_best(available: &[Version], req: &VersionReq) -> Option<Version> {
    available.iter().filter(|v| req.matches(v)).max().cloned()
}
