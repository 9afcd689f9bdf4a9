//! Peripheral descriptor assembly for ipforge.
//!
//! Takes a `PeripheralDecl` (from TOML or the builder), resolves its
//! submodules against a component catalog, resolves parameters in two
//! phases around the register map, composes the port list and freezes the
//! result into a `Peripheral` for downstream emitters.

pub mod assembler;
pub mod batch;
pub mod descriptor;
pub mod error;
pub mod output;
pub mod peripheral;

pub use assembler::{version_code, Assembler, AssemblyOptions};
pub use batch::assemble_all;
pub use descriptor::{Flow, Flows, Identity, PeripheralBuilder, PeripheralDecl};
pub use error::{AssembleError, LoadError, Stage};
pub use peripheral::{Peripheral, SoftwareMacro};
