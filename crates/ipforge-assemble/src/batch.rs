//! Parallel assembly of several peripherals.
//!
//! Each descriptor is assembled on its own scoped thread against the shared,
//! read-only catalog and interface registry. A failure is reported in its own
//! slot and never affects the others.

use std::thread;

use crate::assembler::Assembler;
use crate::descriptor::PeripheralDecl;
use crate::error::AssembleError;
use crate::peripheral::Peripheral;

/// Assemble every descriptor; results come back in input order.
pub fn assemble_all(assembler: &Assembler<'_>, decls: &[PeripheralDecl]) -> Vec<Result<Peripheral, AssembleError>> {
    thread::scope(|scope| {
        let handles: Vec<_> = decls
            .iter()
            .map(|decl| scope.spawn(move || assembler.assemble(decl)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    })
}
