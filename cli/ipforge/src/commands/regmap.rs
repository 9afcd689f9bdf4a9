//! `ipforge regmap`: print the compiled register map of one descriptor.

use std::path::Path;

use anyhow::{Context, Result};

use ipforge_assemble::output::{format_regmap, regmap_json};
use ipforge_assemble::Peripheral;

use super::Session;
use crate::config::OutputFormat;

pub fn run(session: &Session, file: &Path, format: Option<OutputFormat>) -> Result<()> {
    let peripheral = session.assemble_file(file)?;
    print!("{}", render(&peripheral, format.unwrap_or(session.config.output.format))?);
    Ok(())
}

fn render(peripheral: &Peripheral, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => regmap_json(peripheral).context("serializing register map")? + "\n",
        OutputFormat::Text => format_regmap(peripheral),
    })
}
