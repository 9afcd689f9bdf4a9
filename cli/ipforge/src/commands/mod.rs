//! CLI command implementations.

pub mod assemble;
pub mod catalog;
pub mod check;
pub mod macros;
pub mod regmap;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use ipforge_assemble::{Assembler, AssemblyOptions, Peripheral, PeripheralDecl};
use ipforge_registry::{InterfaceRegistry, MemoryCatalog};

use crate::config::IpforgeConfig;

/// The built-in IOb component catalog.
const BUILTIN_CATALOG: &str = include_str!("../../../../catalog/iob_components.toml");

/// Everything a command needs: config, catalog and interface templates.
pub struct Session {
    pub config: IpforgeConfig,
    pub project_dir: PathBuf,
    pub catalog: MemoryCatalog,
    pub interfaces: InterfaceRegistry,
}

impl Session {
    /// Load `ipforge.toml` (if any) above `cwd` and build the catalog.
    pub fn open(cwd: &Path) -> Result<Self> {
        let (config, project_dir) = match IpforgeConfig::find_and_load(cwd)? {
            Some((config, dir)) => (config, dir),
            None => (IpforgeConfig::default(), cwd.to_path_buf()),
        };
        Self::with_config(config, project_dir)
    }

    pub fn with_config(config: IpforgeConfig, project_dir: PathBuf) -> Result<Self> {
        let mut catalog = MemoryCatalog::from_toml(BUILTIN_CATALOG).context("loading built-in catalog")?;
        for path in &config.catalog.paths {
            let path = project_dir.join(path);
            catalog
                .load_file(&path)
                .with_context(|| format!("loading catalog {}", path.display()))?;
        }
        log::debug!("catalog holds {} component versions", catalog.len());

        Ok(Session {
            config,
            project_dir,
            catalog,
            interfaces: InterfaceRegistry::builtin(),
        })
    }

    pub fn assembler(&self) -> Assembler<'_> {
        let options = AssemblyOptions {
            version_register: self.config.assembly.version_register,
            data_width_parameter: self.config.assembly.data_width_parameter.clone(),
        };
        Assembler::new(&self.catalog, &self.interfaces).with_options(options)
    }

    /// Read one descriptor file and assemble it.
    pub fn assemble_file(&self, path: &Path) -> Result<Peripheral> {
        let decl = load_descriptor(path)?;
        Ok(self.assembler().assemble(&decl)?)
    }
}

pub fn load_descriptor(path: &Path) -> Result<PeripheralDecl> {
    PeripheralDecl::load(path).with_context(|| format!("loading descriptor {}", path.display()))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_without_config_uses_builtin_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::with_config(IpforgeConfig::default(), dir.path().to_path_buf()).unwrap();
        assert!(session.catalog.latest().any(|c| c.name == "axis2axi"));
        assert!(session.assembler().options().version_register);
    }

    #[test]
    fn extra_catalog_paths_are_layered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("extra.toml"),
            "[[component]]\nname = \"iob_uart\"\nversion = \"V0.20\"\n",
        )
        .unwrap();
        let mut config = IpforgeConfig::default();
        config.catalog.paths.push(PathBuf::from("extra.toml"));
        let session = Session::with_config(config, dir.path().to_path_buf()).unwrap();
        assert!(session.catalog.latest().any(|c| c.name == "iob_uart"));
        assert!(session.catalog.latest().any(|c| c.name == "iob_reg"));
    }

    #[test]
    fn missing_catalog_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = IpforgeConfig::default();
        config.catalog.paths.push(PathBuf::from("nope.toml"));
        let err = Session::with_config(config, dir.path().to_path_buf()).err().unwrap();
        assert!(format!("{err:#}").contains("nope.toml"));
    }
}
