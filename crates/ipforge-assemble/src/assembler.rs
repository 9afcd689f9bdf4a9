//! The assembly pipeline.
//!
//! submodules -> phase-1 parameters (data width, register widths) ->
//! register map -> phase-2 parameters (with the address-width macro) ->
//! ports -> frozen `Peripheral`.
//!
//! Phase 1 exists because `ADDR_W` defaults to the register map's minimum
//! address width, which in turn needs the data width and the register widths.

use ipforge_core::error::{DescriptorError, DescriptorWarning};
use ipforge_core::expr::Expr;
use ipforge_core::param::{Externals, ParameterTable};
use ipforge_core::port::{compose, InterfaceTemplates};
use ipforge_core::register::{self, Access, Register, RegisterGroup};
use ipforge_registry::catalog::ComponentCatalog;
use ipforge_registry::resolution::resolve;

use crate::descriptor::PeripheralDecl;
use crate::error::{AssembleError, Stage};
use crate::peripheral::{Parts, Peripheral};

/// Name of the automatic version register.
pub const VERSION_REGISTER: &str = "VERSION";

/// Register group the version register is appended in.
pub const VERSION_GROUP: &str = "general";

/// Knobs for one assembly run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyOptions {
    /// Append a read-only `VERSION` register holding the version code.
    pub version_register: bool,
    /// Parameter giving the register bus data width.
    pub data_width_parameter: String,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        AssemblyOptions {
            version_register: false,
            data_width_parameter: "DATA_W".to_string(),
        }
    }
}

/// Numeric code of a `V<major>.<minor>` version string.
///
/// Major and minor are each zero-padded to two digits and the result read as
/// hex: `V0.10` becomes `0x0010`, `V1.2` becomes `0x0102`.
pub fn version_code(version: &str) -> Option<u64> {
    let bare = version.trim().trim_start_matches(['V', 'v']);
    let (major, minor) = bare.split_once('.').unwrap_or((bare, "0"));
    if major.is_empty() || major.len() > 2 || minor.is_empty() || minor.len() > 2 {
        return None;
    }
    if !major.chars().chain(minor.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    u64::from_str_radix(&format!("{major:0>2}{minor:0>2}"), 16).ok()
}

/// Assembles descriptors against a component catalog and interface registry.
pub struct Assembler<'a> {
    catalog: &'a dyn ComponentCatalog,
    interfaces: &'a dyn InterfaceTemplates,
    options: AssemblyOptions,
}

impl<'a> Assembler<'a> {
    pub fn new(catalog: &'a dyn ComponentCatalog, interfaces: &'a dyn InterfaceTemplates) -> Self {
        Assembler {
            catalog,
            interfaces,
            options: AssemblyOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AssemblyOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &AssemblyOptions {
        &self.options
    }

    /// Run the pipeline; the first fatal error aborts with its stage.
    pub fn assemble(&self, decl: &PeripheralDecl) -> Result<Peripheral, AssembleError> {
        let name = decl.name();
        let fail = |stage: Stage| move |source: DescriptorError| AssembleError::new(name, stage, source);
        let mut warnings: Vec<DescriptorWarning> = Vec::new();

        log::debug!("{name}: resolving {} submodule references", decl.submodules().len());
        let submodules = resolve(decl.submodules(), self.catalog, self.interfaces).map_err(fail(Stage::Submodules))?;

        let table = ParameterTable::new(decl.parameters().to_vec()).map_err(fail(Stage::Parameters))?;
        let groups = self.register_groups(decl, &mut warnings);

        // Phase 1: only what the register map needs.
        let data_width_param = self.options.data_width_parameter.as_str();
        if table.get(data_width_param).is_none() {
            return Err(AssembleError::new(
                name,
                Stage::DataWidth,
                DescriptorError::UndefinedParameterReference {
                    reference: data_width_param.to_string(),
                    context: "register bus data width".to_string(),
                },
            ));
        }
        let mut roots = vec![data_width_param];
        for reference in register::width_references(&groups) {
            if !roots.contains(&reference) {
                roots.push(reference);
            }
        }
        let phase1 = table
            .resolve_subset(&roots, &Externals::new())
            .map_err(fail(Stage::DataWidth))?;
        let data_width = phase1.get(data_width_param).unwrap_or(0);
        if data_width <= 0 {
            return Err(AssembleError::new(
                name,
                Stage::DataWidth,
                DescriptorError::InvalidExpression {
                    context: format!("parameter '{data_width_param}'"),
                    detail: format!("data width must be positive, got {data_width}"),
                },
            ));
        }

        log::debug!("{name}: compiling register map at data width {data_width}");
        let registers = register::compile(&groups, data_width as u64, &phase1).map_err(fail(Stage::Registers))?;

        // Phase 2: the full table, with the derived address width visible.
        let mut externals = Externals::new();
        externals.insert(
            register::address_width_macro(name),
            i64::from(registers.min_address_width),
        );
        let parameters = table.resolve(&externals).map_err(fail(Stage::Parameters))?;
        warnings.extend(table.check_hints(&parameters, &externals));

        log::debug!("{name}: composing {} port groups", decl.ports().len());
        let ports = compose(decl.ports(), &parameters, self.interfaces, &mut warnings).map_err(fail(Stage::Ports))?;

        for warning in &warnings {
            log::warn!("{name}: {warning}");
        }

        Parts {
            identity: decl.identity().clone(),
            declared_parameters: decl.parameters().to_vec(),
            submodules,
            parameters,
            derived: externals,
            ports,
            registers,
            warnings,
        }
        .freeze()
        .map_err(|e| {
            AssembleError::new(
                name,
                Stage::Ports,
                DescriptorError::InvalidExpression {
                    context: "peripheral fingerprint".to_string(),
                    detail: e.to_string(),
                },
            )
        })
    }

    /// Declared register groups plus the automatic version register.
    fn register_groups(&self, decl: &PeripheralDecl, warnings: &mut Vec<DescriptorWarning>) -> Vec<RegisterGroup> {
        let mut groups = decl.register_groups().to_vec();
        if !self.options.version_register {
            return groups;
        }

        let declared = groups
            .iter()
            .flat_map(|g| g.registers.iter())
            .any(|r| r.name == VERSION_REGISTER);
        if declared {
            warnings.push(DescriptorWarning {
                subject: format!("register {VERSION_REGISTER}"),
                message: "declared explicitly; automatic version register skipped".to_string(),
            });
            return groups;
        }

        let version = &decl.identity().version;
        let reset = version_code(version).unwrap_or_else(|| {
            warnings.push(DescriptorWarning {
                subject: format!("register {VERSION_REGISTER}"),
                message: format!("version '{version}' is not V<major>.<minor>; reset value 0"),
            });
            0
        });
        groups.push(RegisterGroup::new(
            VERSION_GROUP,
            "General registers.",
            vec![Register::new(VERSION_REGISTER, Access::ReadOnly, Expr::literal(16))
                .with_reset(reset)
                .with_description("Product version.")],
        ));
        groups
    }
}
