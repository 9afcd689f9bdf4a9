//! Assembly and loading errors.

use std::path::PathBuf;

use ipforge_core::error::DescriptorError;
use thiserror::Error;

/// Pipeline stage a failure occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Submodules,
    /// Phase-1 resolution: data width and register widths.
    DataWidth,
    Registers,
    /// Phase-2 resolution: the full table.
    Parameters,
    Ports,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Submodules => "submodule resolution",
            Stage::DataWidth => "data width resolution",
            Stage::Registers => "register map compilation",
            Stage::Parameters => "parameter resolution",
            Stage::Ports => "port composition",
        };
        f.write_str(s)
    }
}

/// A fatal descriptor error, scoped to the peripheral and stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("peripheral '{peripheral}': {stage} failed: {source}")]
pub struct AssembleError {
    pub peripheral: String,
    pub stage: Stage,
    #[source]
    pub source: DescriptorError,
}

impl AssembleError {
    pub fn new(peripheral: &str, stage: Stage, source: DescriptorError) -> Self {
        AssembleError {
            peripheral: peripheral.to_string(),
            stage,
            source,
        }
    }
}

/// Errors reading a descriptor document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown flow '{flow}' (expected one of sim, emb, fpga, lint, doc)")]
    UnknownFlow { flow: String },

    #[error("invalid descriptor: {detail}")]
    Invalid { detail: String },
}
