//! Peripheral descriptor documents and the descriptor builder.
//!
//! A descriptor is read from TOML or built programmatically; either way the
//! result is an immutable `PeripheralDecl`.
//!
//! ```toml
//! submodules = ["iob_reg", { interface = "iob_s_port" }]
//!
//! [peripheral]
//! name = "iob_dma"
//! version = "V0.10"
//! flows = "sim emb"
//!
//! [[parameters]]
//! name = "DATA_W"
//! kind = "P"
//! default = 32
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use ipforge_core::param::Parameter;
use ipforge_core::port::PortGroupDecl;
use ipforge_core::register::RegisterGroup;
use ipforge_core::submodule::SubmoduleDecl;
use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// A generation flow a peripheral supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Sim,
    Emb,
    Fpga,
    Lint,
    Doc,
}

impl Flow {
    pub fn as_str(self) -> &'static str {
        match self {
            Flow::Sim => "sim",
            Flow::Emb => "emb",
            Flow::Fpga => "fpga",
            Flow::Lint => "lint",
            Flow::Doc => "doc",
        }
    }
}

impl std::str::FromStr for Flow {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sim" => Ok(Flow::Sim),
            "emb" => Ok(Flow::Emb),
            "fpga" => Ok(Flow::Fpga),
            "lint" => Ok(Flow::Lint),
            "doc" => Ok(Flow::Doc),
            other => Err(LoadError::UnknownFlow {
                flow: other.to_string(),
            }),
        }
    }
}

/// Set of supported flows, written as a space-separated string (`"sim emb"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Flows(BTreeSet<Flow>);

impl Flows {
    pub fn parse(s: &str) -> Result<Self, LoadError> {
        s.split_whitespace()
            .map(str::parse)
            .collect::<Result<BTreeSet<Flow>, _>>()
            .map(Flows)
    }

    pub fn contains(&self, flow: Flow) -> bool {
        self.0.contains(&flow)
    }

    pub fn iter(&self) -> impl Iterator<Item = Flow> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Flows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.iter().map(Flow::as_str).collect();
        f.write_str(&names.join(" "))
    }
}

impl TryFrom<String> for Flows {
    type Error = LoadError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Flows::parse(&s)
    }
}

impl From<Flows> for String {
    fn from(flows: Flows) -> Self {
        flows.to_string()
    }
}

impl FromIterator<Flow> for Flows {
    fn from_iter<I: IntoIterator<Item = Flow>>(iter: I) -> Self {
        Flows(iter.into_iter().collect())
    }
}

/// Peripheral identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub flows: Flows,
    #[serde(default)]
    pub description: String,
}

/// An immutable peripheral descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeripheralDecl {
    #[serde(default)]
    submodules: Vec<SubmoduleDecl>,
    peripheral: Identity,
    #[serde(default)]
    parameters: Vec<Parameter>,
    #[serde(default)]
    ports: Vec<PortGroupDecl>,
    #[serde(default)]
    register_groups: Vec<RegisterGroup>,
}

impl PeripheralDecl {
    /// Parse a descriptor from a TOML string.
    pub fn parse(s: &str) -> Result<Self, LoadError> {
        let decl: PeripheralDecl = toml::from_str(s)?;
        decl.validate()?;
        Ok(decl)
    }

    /// Read and parse a descriptor file.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    fn validate(&self) -> Result<(), LoadError> {
        let name = &self.peripheral.name;
        let valid = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(LoadError::Invalid {
                detail: format!("peripheral name '{name}' is not an identifier"),
            });
        }
        if self.peripheral.version.trim().is_empty() {
            return Err(LoadError::Invalid {
                detail: format!("peripheral '{name}' has no version"),
            });
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.peripheral.name
    }

    pub fn identity(&self) -> &Identity {
        &self.peripheral
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn ports(&self) -> &[PortGroupDecl] {
        &self.ports
    }

    pub fn register_groups(&self) -> &[RegisterGroup] {
        &self.register_groups
    }

    pub fn submodules(&self) -> &[SubmoduleDecl] {
        &self.submodules
    }
}

/// Accumulates declarations and freezes them into a `PeripheralDecl`.
#[derive(Debug, Clone)]
pub struct PeripheralBuilder {
    decl: PeripheralDecl,
}

impl PeripheralBuilder {
    pub fn new(name: &str, version: &str) -> Self {
        PeripheralBuilder {
            decl: PeripheralDecl {
                submodules: Vec::new(),
                peripheral: Identity {
                    name: name.to_string(),
                    version: version.to_string(),
                    flows: Flows::default(),
                    description: String::new(),
                },
                parameters: Vec::new(),
                ports: Vec::new(),
                register_groups: Vec::new(),
            },
        }
    }

    pub fn flows(mut self, flows: Flows) -> Self {
        self.decl.peripheral.flows = flows;
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.decl.peripheral.description = description.to_string();
        self
    }

    pub fn submodule(mut self, decl: SubmoduleDecl) -> Self {
        self.decl.submodules.push(decl);
        self
    }

    pub fn parameter(mut self, param: Parameter) -> Self {
        self.decl.parameters.push(param);
        self
    }

    pub fn port_group(mut self, group: PortGroupDecl) -> Self {
        self.decl.ports.push(group);
        self
    }

    pub fn register_group(mut self, group: RegisterGroup) -> Self {
        self.decl.register_groups.push(group);
        self
    }

    pub fn build(self) -> Result<PeripheralDecl, LoadError> {
        self.decl.validate()?;
        Ok(self.decl)
    }
}
