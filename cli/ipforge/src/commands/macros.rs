//! `ipforge macros`: print the software macro table as `#define` lines.

use std::path::Path;

use anyhow::{Context, Result};

use ipforge_assemble::output::format_macros;

use super::Session;

/// Print to stdout, or write a header file when `output` is given.
pub fn run(session: &Session, file: &Path, output: Option<&Path>) -> Result<()> {
    let peripheral = session.assemble_file(file)?;
    let table = format_macros(&peripheral);
    match output {
        Some(path) => {
            let guard = format!("{}_SWREG_H", peripheral.name().to_uppercase());
            let header = format!("#ifndef {guard}\n#define {guard}\n\n{table}\n#endif // {guard}\n");
            std::fs::write(path, header).with_context(|| format!("writing {}", path.display()))?;
            println!("{} -> {}", file.display(), path.display());
        }
        None => print!("{table}"),
    }
    Ok(())
}
