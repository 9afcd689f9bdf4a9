//! Port groups and the port composer.
//!
//! A descriptor declares its interface as ordered port groups. Literal groups
//! list their signals; interface-marker groups name a standard bus protocol
//! whose canonical signal template lives in an external registry. The
//! composer expands markers, evaluates widths and flattens everything into one
//! signal list that remembers which group each signal came from.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{DescriptorError, DescriptorWarning, Result};
use crate::expr::Expr;
use crate::param::{eval_error, ResolvedParameters};

/// Signal direction, seen from the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[serde(alias = "I")]
    In,
    #[serde(alias = "O")]
    Out,
    #[serde(alias = "IO")]
    InOut,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::In => write!(f, "input"),
            Direction::Out => write!(f, "output"),
            Direction::InOut => write!(f, "inout"),
        }
    }
}

/// A declared signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    pub direction: Direction,
    pub width: Expr,
    #[serde(default)]
    pub description: String,
}

impl Signal {
    pub fn new(name: &str, direction: Direction, width: Expr, description: &str) -> Self {
        Signal {
            name: name.to_string(),
            direction,
            width,
            description: description.to_string(),
        }
    }
}

/// A literal group of signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortGroup {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub signals: Vec<Signal>,
}

/// A port group declaration: literal signals or a logical interface marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum PortGroupDecl {
    /// Expanded from the interface template registry.
    Interface {
        name: String,
        interface: String,
        #[serde(default)]
        description: String,
    },
    Signals(PortGroup),
}

impl PortGroupDecl {
    pub fn name(&self) -> &str {
        match self {
            PortGroupDecl::Interface { name, .. } => name,
            PortGroupDecl::Signals(group) => &group.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            PortGroupDecl::Interface { description, .. } => description,
            PortGroupDecl::Signals(group) => &group.description,
        }
    }
}

/// A canonical, versioned signal template for a logical interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceTemplate {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    pub signals: Vec<Signal>,
}

/// Lookup of interface templates by marker name.
///
/// Implementations must be safe for concurrent reads; several peripherals may
/// be assembled against one registry in parallel.
pub trait InterfaceTemplates: Send + Sync {
    fn template(&self, marker: &str) -> Option<&InterfaceTemplate>;
}

/// One signal of the flattened peripheral interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatSignal {
    pub name: String,
    pub direction: Direction,
    pub width: u64,
    /// Width expression as declared.
    pub width_expr: String,
    pub description: String,
    /// Port group the signal was declared in.
    pub group: String,
    /// Interface marker, when the group was expanded from a template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
}

/// Summary of one composed group, kept for documentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_version: Option<String>,
    pub signal_count: usize,
}

/// The flattened peripheral interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedPorts {
    pub groups: Vec<GroupSummary>,
    pub signals: Vec<FlatSignal>,
}

impl ComposedPorts {
    /// Signals belonging to one group, in declaration order.
    pub fn group_signals<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a FlatSignal> + 'a {
        self.signals.iter().filter(move |s| s.group == group)
    }

    /// Total bit count per direction.
    pub fn total_bits(&self, direction: Direction) -> u64 {
        self.signals
            .iter()
            .filter(|s| s.direction == direction)
            .map(|s| s.width)
            .sum()
    }
}

/// Flatten `groups` into one interface.
///
/// A template signal whose width resolves to exactly zero (the address bus of
/// a one-word register map) is emitted one bit wide and reported in
/// `warnings`. Zero widths in literal groups are errors.
pub fn compose(
    groups: &[PortGroupDecl],
    params: &ResolvedParameters,
    templates: &dyn InterfaceTemplates,
    warnings: &mut Vec<DescriptorWarning>,
) -> Result<ComposedPorts> {
    let mut seen_groups: HashMap<&str, usize> = HashMap::new();
    let mut seen_signals: HashMap<String, String> = HashMap::new();
    let mut composed = ComposedPorts::default();

    for (position, decl) in groups.iter().enumerate() {
        if let Some(&first) = seen_groups.get(decl.name()) {
            return Err(DescriptorError::DuplicatePortGroup {
                name: decl.name().to_string(),
                first,
                second: position,
            });
        }
        seen_groups.insert(decl.name(), position);

        let (signals, interface, interface_version) = match decl {
            PortGroupDecl::Signals(group) => (group.signals.as_slice(), None, None),
            PortGroupDecl::Interface { interface, .. } => {
                let template =
                    templates
                        .template(interface)
                        .ok_or_else(|| DescriptorError::UnresolvedComponent {
                            name: interface.clone(),
                            position,
                            detail: format!(
                                "no interface template for port group '{}'",
                                decl.name()
                            ),
                        })?;
                (
                    template.signals.as_slice(),
                    Some(interface.clone()),
                    Some(template.version.clone()),
                )
            }
        };

        for signal in signals {
            let context = format!("width of signal '{}' in port group '{}'", signal.name, decl.name());
            let width = signal
                .width
                .eval(|name| params.get(name))
                .map_err(|e| eval_error(e, &context))?;
            let width = match width {
                0 if interface.is_some() => {
                    warnings.push(DescriptorWarning {
                        subject: format!("signal {}", signal.name),
                        message: format!(
                            "width '{}' resolves to 0 in port group '{}'; emitted 1 bit wide",
                            signal.width.source(),
                            decl.name()
                        ),
                    });
                    1
                }
                w => w,
            };
            if width < 1 {
                return Err(DescriptorError::ZeroWidthSignal {
                    group: decl.name().to_string(),
                    signal: signal.name.clone(),
                    width,
                });
            }

            if let Some(first_group) = seen_signals.get(&signal.name) {
                return Err(DescriptorError::DuplicateSignalName {
                    signal: signal.name.clone(),
                    first_group: first_group.clone(),
                    second_group: decl.name().to_string(),
                });
            }
            seen_signals.insert(signal.name.clone(), decl.name().to_string());

            composed.signals.push(FlatSignal {
                name: signal.name.clone(),
                direction: signal.direction,
                width: width as u64,
                width_expr: signal.width.source().to_string(),
                description: signal.description.clone(),
                group: decl.name().to_string(),
                interface: interface.clone(),
            });
        }

        log::debug!("port group '{}': {} signals", decl.name(), signals.len());
        composed.groups.push(GroupSummary {
            name: decl.name().to_string(),
            description: decl.description().to_string(),
            interface,
            interface_version,
            signal_count: signals.len(),
        });
    }

    Ok(composed)
}
