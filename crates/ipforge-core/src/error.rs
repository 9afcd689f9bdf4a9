//! Error and warning types for descriptor processing.
//!
//! Every variant is fatal to the assembly of the peripheral being processed.
//! Variants carry the names and declaration positions needed to locate the
//! offending declaration.

use serde::{Deserialize, Serialize};

/// Errors raised while resolving, composing or compiling a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    /// A component or interface marker is unknown to the registry.
    #[error("unresolved component '{name}' (declaration #{position}): {detail}")]
    UnresolvedComponent {
        name: String,
        position: usize,
        detail: String,
    },

    /// The same component+options pair was declared twice with different overrides.
    #[error(
        "component '{component}' declared with options {options} at #{first} and #{second} \
         with conflicting settings: {detail}"
    )]
    ConflictingOptions {
        component: String,
        options: String,
        first: usize,
        second: usize,
        detail: String,
    },

    /// Parameter defaults reference each other in a cycle.
    #[error("cyclic parameter reference: {}", .cycle.join(" -> "))]
    CyclicParameterReference { cycle: Vec<String> },

    /// A resolved numeric parameter lies outside its declared bounds.
    #[error(
        "parameter '{name}' resolved to {value}, outside bounds [{}, {}]",
        bound_label(.min),
        bound_label(.max)
    )]
    OutOfBounds {
        name: String,
        value: i64,
        min: Option<i64>,
        max: Option<i64>,
    },

    /// An expression references a name that is neither declared nor external.
    #[error("undefined parameter '{reference}' referenced by {context}")]
    UndefinedParameterReference { reference: String, context: String },

    /// A signal name appears twice in the flattened interface.
    #[error("signal '{signal}' declared in port group '{first_group}' and again in '{second_group}'")]
    DuplicateSignalName {
        signal: String,
        first_group: String,
        second_group: String,
    },

    /// A port group name appears twice in one descriptor.
    #[error("port group '{name}' declared twice (#{first} and #{second})")]
    DuplicatePortGroup {
        name: String,
        first: usize,
        second: usize,
    },

    /// A register resolves to a bit width of zero (or less).
    #[error("register '{group}.{name}' (#{position}) has zero bit width")]
    ZeroWidthRegister {
        group: String,
        name: String,
        position: usize,
    },

    /// A register name appears twice within one register group.
    #[error("register '{name}' declared twice in group '{group}' (#{first} and #{second})")]
    DuplicateRegisterName {
        group: String,
        name: String,
        first: usize,
        second: usize,
    },

    /// A parameter name appears twice in the parameter list.
    #[error("parameter '{name}' declared twice (#{first} and #{second})")]
    DuplicateParameter {
        name: String,
        first: usize,
        second: usize,
    },

    /// A signal width resolves to zero or a negative value.
    #[error("signal '{signal}' in port group '{group}' resolves to width {width}")]
    ZeroWidthSignal {
        group: String,
        signal: String,
        width: i64,
    },

    /// An expression failed to parse or evaluate.
    #[error("invalid expression in {context}: {detail}")]
    InvalidExpression { context: String, detail: String },
}

fn bound_label(bound: &Option<i64>) -> String {
    match bound {
        Some(v) => v.to_string(),
        None => "NA".to_string(),
    }
}

/// A non-fatal finding attached to an assembled peripheral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorWarning {
    /// The declaration the warning is about (e.g. `parameter BUFFER_W`).
    pub subject: String,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for DescriptorWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

/// Result type alias for descriptor operations.
pub type Result<T> = std::result::Result<T, DescriptorError>;
