//! `ipforge.toml` project configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "ipforge.toml";

/// The top-level project configuration. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IpforgeConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub assembly: AssemblyConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Project metadata section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            name: None,
            version: default_version(),
        }
    }
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// Extra component catalogs, layered over the built-in IOb catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Catalog TOML files, relative to the project directory.
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

/// Assembly options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssemblyConfig {
    /// Append the automatic `VERSION` register.
    #[serde(default = "default_true")]
    pub version_register: bool,
    /// Parameter holding the register bus width.
    #[serde(default = "default_data_width")]
    pub data_width_parameter: String,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        AssemblyConfig {
            version_register: true,
            data_width_parameter: default_data_width(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_data_width() -> String {
    "DATA_W".to_string()
}

/// Output format for `ipforge assemble`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
        }
    }
}

/// Output section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for emitted documents; stdout when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub format: OutputFormat,
}

impl IpforgeConfig {
    /// Search upward from `start_dir` for an `ipforge.toml`, returning it with
    /// the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let config: IpforgeConfig = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                log::debug!("using {}", candidate.display());
                return Ok(Some((config, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing ipforge.toml")
    }

    /// A starter configuration.
    #[cfg(test)]
    pub fn template(name: &str) -> String {
        format!(
            r#"[project]
name = "{name}"
version = "0.1.0"

[catalog]
paths = []

[assembly]
version-register = true

[output]
format = "json"
"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config = IpforgeConfig::from_str(
            r#"
[project]
name = "soc"
version = "2.1.0"

[catalog]
paths = ["vendor/catalog.toml", "local.toml"]

[assembly]
version-register = false
data-width-parameter = "BUS_W"

[output]
dir = "build/descriptors"
format = "text"
"#,
        )
        .unwrap();
        assert_eq!(config.project.name.as_deref(), Some("soc"));
        assert_eq!(config.catalog.paths.len(), 2);
        assert!(!config.assembly.version_register);
        assert_eq!(config.assembly.data_width_parameter, "BUS_W");
        assert_eq!(config.output.dir, Some(PathBuf::from("build/descriptors")));
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = IpforgeConfig::from_str("").unwrap();
        assert!(config.project.name.is_none());
        assert_eq!(config.project.version, "0.1.0");
        assert!(config.catalog.paths.is_empty());
        assert!(config.assembly.version_register);
        assert_eq!(config.assembly.data_width_parameter, "DATA_W");
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn unknown_format_rejected() {
        assert!(IpforgeConfig::from_str("[output]\nformat = \"yaml\"\n").is_err());
    }

    #[test]
    fn template_round_trips() {
        let config = IpforgeConfig::from_str(&IpforgeConfig::template("demo")).unwrap();
        assert_eq!(config.project.name.as_deref(), Some("demo"));
        assert!(config.assembly.version_register);
    }

    #[test]
    fn find_and_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[project]\nname = \"parent\"\n").unwrap();
        let nested = dir.path().join("rtl").join("dma");
        std::fs::create_dir_all(&nested).unwrap();

        let (config, found) = IpforgeConfig::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(config.project.name.as_deref(), Some("parent"));
        assert_eq!(found, dir.path());
    }

    #[test]
    fn find_and_load_reports_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[assembly]\nversion-register = \"yes\"\n").unwrap();
        let err = IpforgeConfig::find_and_load(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));
    }
}
