//! Submodule references as they appear in a peripheral descriptor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::expr::Expr;

/// Option set qualifying a component instance (e.g. `purpose = "fpga"`).
///
/// Keys are kept sorted, so two declarations that list the same options in a
/// different order compare equal.
pub type Options = BTreeMap<String, String>;

/// One entry of a descriptor's submodule list.
///
/// Table entries reject unknown keys: options belong under `options`, not
/// beside `component`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum SubmoduleDecl {
    /// A logical interface marker; expands into a port-group template.
    Interface { interface: String },
    /// A bare component reference.
    Component(String),
    /// A component qualified by options, a version requirement or parameter overrides.
    WithOptions {
        component: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        options: Options,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        params: BTreeMap<String, Expr>,
    },
}

impl SubmoduleDecl {
    pub fn interface(marker: &str) -> Self {
        SubmoduleDecl::Interface {
            interface: marker.to_string(),
        }
    }

    pub fn component(name: &str) -> Self {
        SubmoduleDecl::Component(name.to_string())
    }

    pub fn with_options(name: &str, options: &[(&str, &str)]) -> Self {
        SubmoduleDecl::WithOptions {
            component: name.to_string(),
            options: options
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            version: None,
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter override. A bare reference becomes a qualified one.
    pub fn with_param(self, name: &str, value: Expr) -> Self {
        match self {
            SubmoduleDecl::Interface { .. } => self,
            SubmoduleDecl::Component(component) => SubmoduleDecl::WithOptions {
                component,
                options: Options::new(),
                version: None,
                params: BTreeMap::from([(name.to_string(), value)]),
            },
            SubmoduleDecl::WithOptions {
                component,
                options,
                version,
                mut params,
            } => {
                params.insert(name.to_string(), value);
                SubmoduleDecl::WithOptions {
                    component,
                    options,
                    version,
                    params,
                }
            }
        }
    }

    /// Pin a version requirement (semver syntax).
    pub fn with_version(self, requirement: &str) -> Self {
        match self {
            SubmoduleDecl::Interface { .. } => self,
            SubmoduleDecl::Component(component) => SubmoduleDecl::WithOptions {
                component,
                options: Options::new(),
                version: Some(requirement.to_string()),
                params: BTreeMap::new(),
            },
            SubmoduleDecl::WithOptions {
                component,
                options,
                params,
                ..
            } => SubmoduleDecl::WithOptions {
                component,
                options,
                version: Some(requirement.to_string()),
                params,
            },
        }
    }

    /// The referenced component or interface marker name.
    pub fn name(&self) -> &str {
        match self {
            SubmoduleDecl::Interface { interface } => interface,
            SubmoduleDecl::Component(name) => name,
            SubmoduleDecl::WithOptions { component, .. } => component,
        }
    }

    pub fn is_interface(&self) -> bool {
        matches!(self, SubmoduleDecl::Interface { .. })
    }

    /// Options of a component reference; empty for bare references and markers.
    pub fn options(&self) -> Options {
        match self {
            SubmoduleDecl::WithOptions { options, .. } => options.clone(),
            _ => Options::new(),
        }
    }
}

/// Display label for an instance: `name` or `name[k=v,k2=v2]`.
pub fn instance_label(component: &str, options: &Options) -> String {
    if options.is_empty() {
        return component.to_string();
    }
    let opts: Vec<String> = options.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{component}[{}]", opts.join(","))
}
