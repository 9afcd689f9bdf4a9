//! `ipforge check`: assemble descriptors and report per-file status.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use ipforge_assemble::Peripheral;

use super::{load_descriptor, Session};

pub fn run(session: &Session, files: &[PathBuf]) -> Result<()> {
    let assembler = session.assembler();
    let mut failed = 0;

    for file in files {
        let outcome = load_descriptor(file).and_then(|decl| Ok(assembler.assemble(&decl)?));
        match outcome {
            Ok(peripheral) => {
                println!("{}", summary_line(file, &peripheral));
                for warning in peripheral.warnings() {
                    println!("  warning: {warning}");
                }
            }
            Err(e) => {
                failed += 1;
                println!("FAIL {}: {e:#}", file.display());
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} descriptors failed", files.len());
    }
    Ok(())
}

fn summary_line(file: &Path, peripheral: &Peripheral) -> String {
    let map = peripheral.registers();
    format!(
        "ok   {}: {} {} ({} submodules, {} parameters, {} signals, {} registers, address width {})",
        file.display(),
        peripheral.name(),
        peripheral.identity().version,
        peripheral.submodules().len(),
        peripheral.parameters().len(),
        peripheral.ports().signals.len(),
        map.entries.len(),
        map.min_address_width,
    )
}
