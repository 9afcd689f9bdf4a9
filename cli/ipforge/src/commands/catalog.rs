//! `ipforge catalog list`: show the components and interfaces available.

use anyhow::Result;

use ipforge_assemble::output::render_table;
use ipforge_core::port::InterfaceTemplates;
use ipforge_registry::{ComponentCatalog, InterfaceRegistry, MemoryCatalog};

use super::Session;

pub fn list(session: &Session) -> Result<()> {
    print!("{}", format_catalog(&session.catalog)?);
    println!();
    print!("{}", format_interfaces(&session.interfaces));
    Ok(())
}

fn format_catalog(catalog: &MemoryCatalog) -> Result<String> {
    let mut rows = Vec::new();
    for name in catalog.component_names() {
        let versions = catalog.list_versions(name)?;
        let Some(latest) = catalog.latest().find(|c| c.name == name) else {
            continue;
        };
        rows.push(vec![
            name.to_string(),
            latest.version.clone(),
            versions.len().to_string(),
            latest.parameters.len().to_string(),
            latest.description.clone(),
        ]);
    }
    Ok(render_table(
        "Components",
        &["Component", "Latest", "Versions", "Params", "Description"],
        &rows,
    ))
}

fn format_interfaces(interfaces: &InterfaceRegistry) -> String {
    let rows: Vec<Vec<String>> = interfaces
        .markers()
        .filter_map(|marker| interfaces.template(marker))
        .map(|t| {
            vec![
                t.name.clone(),
                t.version.clone(),
                t.signals.len().to_string(),
                t.description.clone(),
            ]
        })
        .collect();
    render_table("Interfaces", &["Marker", "Version", "Signals", "Description"], &rows)
}
