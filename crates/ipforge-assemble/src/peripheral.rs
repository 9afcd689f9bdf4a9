//! The frozen, validated peripheral model handed to emitters.

use ipforge_core::error::DescriptorWarning;
use ipforge_core::hash::Fingerprint;
use ipforge_core::param::{Externals, Parameter, ResolvedParameters};
use ipforge_core::port::ComposedPorts;
use ipforge_core::register::{self, RegisterMap};
use ipforge_registry::resolution::ResolvedSubmodules;
use serde::{Deserialize, Serialize};

use crate::descriptor::Identity;

/// A named constant for software headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareMacro {
    pub name: String,
    pub value: u64,
}

/// Everything assembled, before fingerprinting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Parts {
    pub identity: Identity,
    pub declared_parameters: Vec<Parameter>,
    pub submodules: ResolvedSubmodules,
    pub parameters: ResolvedParameters,
    /// Macros derived during assembly (the register address width).
    pub derived: Externals,
    pub ports: ComposedPorts,
    pub registers: RegisterMap,
    pub warnings: Vec<DescriptorWarning>,
}

impl Parts {
    /// Fingerprint the model and freeze it.
    pub fn freeze(self) -> Result<Peripheral, serde_json::Error> {
        let content = (
            &self.identity,
            &self.submodules,
            &self.parameters,
            &self.derived,
            &self.ports,
            &self.registers,
        );
        let fingerprint = Fingerprint::of(&content)?;
        Ok(Peripheral { parts: self, fingerprint })
    }
}

/// An assembled peripheral. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Peripheral {
    #[serde(flatten)]
    parts: Parts,
    fingerprint: Fingerprint,
}

impl Peripheral {
    pub fn name(&self) -> &str {
        &self.parts.identity.name
    }

    pub fn identity(&self) -> &Identity {
        &self.parts.identity
    }

    /// Parameter declarations as written, for documentation emitters.
    pub fn declared_parameters(&self) -> &[Parameter] {
        &self.parts.declared_parameters
    }

    pub fn submodules(&self) -> &ResolvedSubmodules {
        &self.parts.submodules
    }

    pub fn parameters(&self) -> &ResolvedParameters {
        &self.parts.parameters
    }

    pub fn derived_macros(&self) -> &Externals {
        &self.parts.derived
    }

    pub fn ports(&self) -> &ComposedPorts {
        &self.parts.ports
    }

    pub fn registers(&self) -> &RegisterMap {
        &self.parts.registers
    }

    pub fn warnings(&self) -> &[DescriptorWarning] {
        &self.parts.warnings
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Software macro table: address width, then per-register address and width.
    ///
    /// Addresses are byte addresses when the bus width is a whole number of
    /// bytes, word addresses otherwise.
    pub fn macros(&self) -> Vec<SoftwareMacro> {
        let prefix = self.parts.identity.name.to_uppercase();
        let mut out = vec![SoftwareMacro {
            name: register::address_width_macro(&self.parts.identity.name),
            value: u64::from(self.parts.registers.min_address_width),
        }];
        for entry in &self.parts.registers.entries {
            out.push(SoftwareMacro {
                name: format!("{prefix}_{}_ADDR", entry.name),
                value: entry.byte_address.unwrap_or(entry.address),
            });
            out.push(SoftwareMacro {
                name: format!("{prefix}_{}_W", entry.name),
                value: entry.width,
            });
        }
        out
    }
}
