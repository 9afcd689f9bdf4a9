//! Descriptor model for ipforge.
//!
//! A hardware peripheral is described declaratively: configuration
//! parameters, port groups, memory-mapped software registers and the
//! submodules it instantiates. This crate holds the typed model and the
//! pure building blocks used during assembly:
//!
//! - [`expr`] — integer expressions shared by defaults, bounds and widths
//! - [`param`] — parameter table with topological resolution
//! - [`port`] — port group flattening
//! - [`register`] — register address map compilation
//! - [`hash`] — content fingerprints

pub mod error;
pub mod expr;
pub mod hash;
pub mod param;
pub mod port;
pub mod register;
pub mod submodule;

pub use error::{DescriptorError, DescriptorWarning, Result};
pub use expr::{EvalError, Expr, ParseError};
pub use hash::Fingerprint;
pub use param::{Bound, Externals, ParamKind, Parameter, ParameterTable, ResolvedParameters};
pub use port::{
    compose, ComposedPorts, Direction, FlatSignal, InterfaceTemplate, InterfaceTemplates, PortGroup,
    PortGroupDecl, Signal,
};
pub use register::{Access, Register, RegisterEntry, RegisterGroup, RegisterMap};
pub use submodule::{instance_label, Options, SubmoduleDecl};
