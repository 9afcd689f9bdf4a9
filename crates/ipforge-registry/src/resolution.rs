//! Submodule resolution.
//!
//! Turns a descriptor's submodule list into the ordered set of component
//! instances it needs plus the interface markers it uses. Instances are
//! deduplicated on (component, options); the same component under two
//! different option sets (e.g. `purpose = "simulation"` and
//! `purpose = "fpga"`) stays two instances. First occurrence wins the
//! position.

use std::collections::{BTreeMap, HashMap};

use ipforge_core::error::{DescriptorError, Result};
use ipforge_core::expr::Expr;
use ipforge_core::param::Parameter;
use ipforge_core::port::{InterfaceTemplates, PortGroup};
use ipforge_core::submodule::{instance_label, Options, SubmoduleDecl};
use serde::{Deserialize, Serialize};

use crate::catalog::{fetch_best, ComponentCatalog};

/// One component instance the peripheral depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedInstance {
    pub component: String,
    /// `component` or `component[k=v,...]`.
    pub label: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: Options,
    /// Catalog version the reference resolved to.
    pub version: String,
    /// Position of the first declaration.
    pub position: usize,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, Expr>,
    /// Contract of the resolved version.
    pub parameters: Vec<Parameter>,
    pub ports: Vec<PortGroup>,
}

/// An interface marker the peripheral declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedInterface {
    pub marker: String,
    pub version: String,
    pub position: usize,
}

/// Result of submodule resolution, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSubmodules {
    pub instances: Vec<ResolvedInstance>,
    pub interfaces: Vec<ResolvedInterface>,
}

impl ResolvedSubmodules {
    /// Instances of one component, across option sets.
    pub fn instances_of<'a>(&'a self, component: &'a str) -> impl Iterator<Item = &'a ResolvedInstance> + 'a {
        self.instances.iter().filter(move |i| i.component == component)
    }

    pub fn len(&self) -> usize {
        self.instances.len() + self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty() && self.interfaces.is_empty()
    }
}

/// Settings that must agree between two declarations of the same instance.
struct Settings<'a> {
    version: Option<&'a str>,
    params: Option<&'a BTreeMap<String, Expr>>,
}

impl Settings<'_> {
    fn of(decl: &SubmoduleDecl) -> Settings<'_> {
        match decl {
            SubmoduleDecl::WithOptions { version, params, .. } => Settings {
                version: version.as_deref(),
                params: (!params.is_empty()).then_some(params),
            },
            _ => Settings {
                version: None,
                params: None,
            },
        }
    }

    fn conflict(&self, other: &Settings<'_>) -> Option<String> {
        if self.version != other.version {
            return Some(format!(
                "version requirement {} vs {}",
                self.version.unwrap_or("*"),
                other.version.unwrap_or("*")
            ));
        }
        if self.params != other.params {
            return Some(format!(
                "parameter overrides {} vs {}",
                describe_overrides(self.params),
                describe_overrides(other.params)
            ));
        }
        None
    }
}

fn describe_options(options: &Options) -> String {
    let items: Vec<String> = options.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("[{}]", items.join(","))
}

fn describe_overrides(params: Option<&BTreeMap<String, Expr>>) -> String {
    match params {
        None => "{}".to_string(),
        Some(p) => {
            let items: Vec<String> = p.iter().map(|(k, v)| format!("{k}={v}")).collect();
            format!("{{{}}}", items.join(", "))
        }
    }
}

/// Resolve `decls` against a component catalog and an interface registry.
pub fn resolve(
    decls: &[SubmoduleDecl],
    catalog: &dyn ComponentCatalog,
    interfaces: &dyn InterfaceTemplates,
) -> Result<ResolvedSubmodules> {
    let mut out = ResolvedSubmodules::default();
    let mut seen: HashMap<(String, Options), (usize, Settings<'_>)> = HashMap::new();

    for (position, decl) in decls.iter().enumerate() {
        if let SubmoduleDecl::Interface { interface } = decl {
            let template =
                interfaces
                    .template(interface)
                    .ok_or_else(|| DescriptorError::UnresolvedComponent {
                        name: interface.clone(),
                        position,
                        detail: "unknown interface marker".to_string(),
                    })?;
            if !out.interfaces.iter().any(|i| &i.marker == interface) {
                out.interfaces.push(ResolvedInterface {
                    marker: interface.clone(),
                    version: template.version.clone(),
                    position,
                });
            }
            continue;
        }

        let component = decl.name();
        let options = decl.options();
        let settings = Settings::of(decl);
        let key = (component.to_string(), options.clone());

        if let Some((first, existing)) = seen.get(&key) {
            if let Some(detail) = existing.conflict(&settings) {
                return Err(DescriptorError::ConflictingOptions {
                    component: component.to_string(),
                    options: describe_options(&options),
                    first: *first,
                    second: position,
                    detail,
                });
            }
            log::debug!("submodule {} repeated at #{position}, merged", instance_label(component, &options));
            continue;
        }

        let spec = fetch_best(catalog, component, settings.version).map_err(|e| {
            DescriptorError::UnresolvedComponent {
                name: component.to_string(),
                position,
                detail: e.to_string(),
            }
        })?;

        let overrides = settings.params.cloned().unwrap_or_default();
        for name in overrides.keys() {
            if spec.parameter(name).is_none() {
                return Err(DescriptorError::UndefinedParameterReference {
                    reference: name.clone(),
                    context: format!("override of component '{component}' {}", spec.version),
                });
            }
        }

        let label = instance_label(component, &options);
        log::debug!("submodule {label} -> {} {}", spec.name, spec.version);
        out.instances.push(ResolvedInstance {
            component: component.to_string(),
            label,
            options,
            version: spec.version.clone(),
            position,
            overrides,
            parameters: spec.parameters.clone(),
            ports: spec.ports.clone(),
        });
        seen.insert(key, (position, settings));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::component::ComponentSpec;
    use crate::interface::InterfaceRegistry;

    fn catalog() -> MemoryCatalog {
        let mut c = MemoryCatalog::new();
        for name in ["iob_reg", "iob_reg_e", "axis2axi", "iob_mux", "iob_demux"] {
            c.insert(ComponentSpec::new(name, "V0.10")).unwrap();
        }
        c.insert(
            ComponentSpec::new("iob_ram_2p", "V0.10")
                .with_parameter(Parameter::numeric("DATA_W", Expr::literal(0)))
                .with_parameter(Parameter::numeric("ADDR_W", Expr::literal(0))),
        )
        .unwrap();
        c
    }

    #[test]
    fn purposes_stay_distinct() {
        let decls = vec![
            SubmoduleDecl::interface("iob_s_port"),
            SubmoduleDecl::component("iob_reg"),
            SubmoduleDecl::with_options("iob_ram_2p", &[("purpose", "simulation")]),
            SubmoduleDecl::with_options("iob_ram_2p", &[("purpose", "fpga")]),
        ];
        let out = resolve(&decls, &catalog(), &InterfaceRegistry::builtin()).unwrap();
        assert_eq!(out.instances_of("iob_ram_2p").count(), 2);
        let labels: Vec<&str> = out.instances.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["iob_reg", "iob_ram_2p[purpose=simulation]", "iob_ram_2p[purpose=fpga]"]
        );
        assert_eq!(out.interfaces.len(), 1);
        assert_eq!(out.instances[0].position, 1);
    }

    #[test]
    fn identical_references_merge() {
        let decls = vec![
            SubmoduleDecl::component("iob_reg"),
            SubmoduleDecl::component("iob_mux"),
            SubmoduleDecl::component("iob_reg"),
            SubmoduleDecl::with_options("iob_reg", &[]),
        ];
        let out = resolve(&decls, &catalog(), &InterfaceRegistry::builtin()).unwrap();
        let labels: Vec<&str> = out.instances.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["iob_reg", "iob_mux"]);
    }

    #[test]
    fn duplicate_markers_collapse() {
        let decls = vec![
            SubmoduleDecl::interface("iob_s_port"),
            SubmoduleDecl::interface("axi_m_port"),
            SubmoduleDecl::interface("iob_s_port"),
        ];
        let out = resolve(&decls, &catalog(), &InterfaceRegistry::builtin()).unwrap();
        let markers: Vec<&str> = out.interfaces.iter().map(|i| i.marker.as_str()).collect();
        assert_eq!(markers, vec!["iob_s_port", "axi_m_port"]);
    }

    #[test]
    fn unknown_component_and_marker() {
        let decls = vec![SubmoduleDecl::component("iob_reg"), SubmoduleDecl::component("iob_fifo")];
        match resolve(&decls, &catalog(), &InterfaceRegistry::builtin()) {
            Err(DescriptorError::UnresolvedComponent { name, position, .. }) => {
                assert_eq!(name, "iob_fifo");
                assert_eq!(position, 1);
            }
            other => panic!("expected UnresolvedComponent, got {other:?}"),
        }

        let decls = vec![SubmoduleDecl::interface("apb_s_port")];
        assert!(matches!(
            resolve(&decls, &catalog(), &InterfaceRegistry::builtin()),
            Err(DescriptorError::UnresolvedComponent { .. })
        ));
    }

    #[test]
    fn conflicting_overrides() {
        let decls = vec![
            SubmoduleDecl::with_options("iob_ram_2p", &[("purpose", "fpga")])
                .with_param("DATA_W", Expr::literal(32)),
            SubmoduleDecl::with_options("iob_ram_2p", &[("purpose", "fpga")])
                .with_param("DATA_W", Expr::literal(64)),
        ];
        let err = resolve(&decls, &catalog(), &InterfaceRegistry::builtin()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("with options [purpose=fpga] at #0 and #1"), "{message}");
        match err {
            DescriptorError::ConflictingOptions {
                component,
                options,
                first,
                second,
                detail,
            } => {
                assert_eq!(component, "iob_ram_2p");
                assert_eq!(options, "[purpose=fpga]");
                assert_eq!((first, second), (0, 1));
                assert!(detail.contains("DATA_W=32"));
            }
            other => panic!("expected ConflictingOptions, got {other:?}"),
        }
    }

    #[test]
    fn matching_overrides_merge() {
        let decl = SubmoduleDecl::with_options("iob_ram_2p", &[("purpose", "fpga")])
            .with_param("ADDR_W", Expr::literal(10));
        let out = resolve(&[decl.clone(), decl], &catalog(), &InterfaceRegistry::builtin()).unwrap();
        assert_eq!(out.instances.len(), 1);
        assert_eq!(out.instances[0].overrides["ADDR_W"], Expr::literal(10));
    }

    #[test]
    fn override_of_undeclared_parameter() {
        let decl = SubmoduleDecl::component("iob_ram_2p").with_param("DEPTH", Expr::literal(4));
        assert!(matches!(
            resolve(&[decl], &catalog(), &InterfaceRegistry::builtin()),
            Err(DescriptorError::UndefinedParameterReference { .. })
        ));
    }

    #[test]
    fn version_requirement_selects() {
        let mut c = catalog();
        c.insert(ComponentSpec::new("iob_reg", "V0.20")).unwrap();
        let latest = resolve(&[SubmoduleDecl::component("iob_reg")], &c, &InterfaceRegistry::new()).unwrap();
        assert_eq!(latest.instances[0].version, "V0.20");
        let pinned = resolve(
            &[SubmoduleDecl::component("iob_reg").with_version("^0.10")],
            &c,
            &InterfaceRegistry::new(),
        )
        .unwrap();
        assert_eq!(pinned.instances[0].version, "V0.10");
    }
}
