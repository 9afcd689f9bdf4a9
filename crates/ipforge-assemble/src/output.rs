//! Emitted artifacts: JSON documents, the macro table and text listings.

use serde::Serialize;
use serde_json::json;

use crate::peripheral::Peripheral;
use ipforge_registry::tree::format_tree;

/// One row of the flattened register map document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegmapRow<'a> {
    pub name: &'a str,
    pub group: &'a str,
    pub address: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_address: Option<u64>,
    pub width: u64,
    pub access: &'static str,
    pub reset: u64,
    pub autoreg: bool,
}

/// Register map rows in address order.
pub fn regmap_rows(peripheral: &Peripheral) -> Vec<RegmapRow<'_>> {
    peripheral
        .registers()
        .entries
        .iter()
        .map(|e| RegmapRow {
            name: &e.name,
            group: &e.group,
            address: e.address,
            byte_address: e.byte_address,
            width: e.width,
            access: e.access.code(),
            reset: e.reset,
            autoreg: e.autoreg,
        })
        .collect()
}

/// The whole frozen peripheral as pretty JSON.
pub fn peripheral_json(peripheral: &Peripheral) -> serde_json::Result<String> {
    serde_json::to_string_pretty(peripheral)
}

/// The register map document consumed by software emitters.
pub fn regmap_json(peripheral: &Peripheral) -> serde_json::Result<String> {
    let map = peripheral.registers();
    serde_json::to_string_pretty(&json!({
        "peripheral": peripheral.name(),
        "version": peripheral.identity().version,
        "data_width": map.data_width,
        "address_width": map.min_address_width,
        "total_words": map.total_words,
        "registers": regmap_rows(peripheral),
    }))
}

/// `#define` lines for the software macro table.
pub fn format_macros(peripheral: &Peripheral) -> String {
    let macros = peripheral.macros();
    let width = macros.iter().map(|m| m.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for m in &macros {
        out.push_str(&format!("#define {:<width$} {}\n", m.name, m.value));
    }
    out
}

/// Render a box-drawn table under a `=== title ===` banner.
pub fn render_table(title: &str, headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let rule = |left: &str, mid: &str, right: &str| {
        let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{left}{}{right}\n", segments.join(mid))
    };
    let line = |cells: &[String]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!(" {c:<w$} "))
            .collect();
        format!("│{}│\n", padded.join("│"))
    };

    let mut text = format!("=== {title} ===\n\n");
    text.push_str(&rule("┌", "┬", "┐"));
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    text.push_str(&line(&header_cells));
    text.push_str(&rule("├", "┼", "┤"));
    for row in rows {
        text.push_str(&line(row));
    }
    text.push_str(&rule("└", "┴", "┘"));
    text
}

/// Register map listing.
pub fn format_regmap(peripheral: &Peripheral) -> String {
    let map = peripheral.registers();
    let rows: Vec<Vec<String>> = map
        .entries
        .iter()
        .map(|e| {
            vec![
                e.group.clone(),
                e.name.clone(),
                e.access.code().to_string(),
                e.width.to_string(),
                e.address.to_string(),
                e.byte_address.map(|b| format!("0x{b:x}")).unwrap_or_else(|| "-".to_string()),
                format!("0x{:x}", e.reset),
            ]
        })
        .collect();
    let mut text = render_table(
        "Register Map",
        &["Group", "Register", "Access", "Width", "Word", "Byte", "Reset"],
        &rows,
    );
    text.push_str(&format!(
        "\n{} registers, {} words ({} padding), data width {}, address width {}\n",
        map.entries.len(),
        map.total_words,
        map.padding_words,
        map.data_width,
        map.min_address_width
    ));
    text
}

/// Resolved parameter listing.
pub fn format_parameters(peripheral: &Peripheral) -> String {
    let rows: Vec<Vec<String>> = peripheral
        .declared_parameters()
        .iter()
        .map(|p| {
            let value = peripheral
                .parameters()
                .get(&p.name)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string());
            vec![
                p.name.clone(),
                format!("{:?}", p.kind).to_lowercase(),
                p.default.to_string(),
                value,
            ]
        })
        .collect();
    render_table("Parameters", &["Name", "Kind", "Default", "Value"], &rows)
}

/// Flattened port listing.
pub fn format_ports(peripheral: &Peripheral) -> String {
    let rows: Vec<Vec<String>> = peripheral
        .ports()
        .signals
        .iter()
        .map(|s| {
            vec![
                s.group.clone(),
                s.name.clone(),
                s.direction.to_string(),
                s.width.to_string(),
                s.width_expr.clone(),
            ]
        })
        .collect();
    render_table("Ports", &["Group", "Signal", "Direction", "Width", "Declared"], &rows)
}

/// Full human-readable report.
pub fn format_text(peripheral: &Peripheral) -> String {
    let identity = peripheral.identity();
    let mut text = format!(
        "{} {} [{}]\nfingerprint sha256:{}\n\n",
        identity.name,
        identity.version,
        identity.flows,
        peripheral.fingerprint().short(12)
    );
    text.push_str(&format_tree(&identity.name, &identity.version, peripheral.submodules()));
    text.push('\n');
    text.push_str(&format_parameters(peripheral));
    text.push('\n');
    text.push_str(&format_ports(peripheral));
    text.push('\n');
    text.push_str(&format_regmap(peripheral));
    if !peripheral.warnings().is_empty() {
        text.push_str("\nWarnings:\n");
        for w in peripheral.warnings() {
            text.push_str(&format!("  - {w}\n"));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::Assembler;
    use crate::descriptor::PeripheralBuilder;
    use ipforge_core::expr::Expr;
    use ipforge_core::param::Parameter;
    use ipforge_core::register::{Access, Register, RegisterGroup};
    use ipforge_registry::{InterfaceRegistry, MemoryCatalog};

    fn peripheral() -> Peripheral {
        let decl = PeripheralBuilder::new("iob_gpio", "V0.10")
            .parameter(Parameter::numeric("DATA_W", Expr::literal(32)))
            .register_group(RegisterGroup::new(
                "gpio",
                "",
                vec![
                    Register::new("INPUT", Access::ReadOnly, Expr::literal(32)),
                    Register::new("OUTPUT", Access::WriteOnly, Expr::literal(32)).with_reset(0xff),
                ],
            ))
            .build()
            .unwrap();
        let catalog = MemoryCatalog::new();
        let interfaces = InterfaceRegistry::builtin();
        Assembler::new(&catalog, &interfaces).assemble(&decl).unwrap()
    }

    #[test]
    fn regmap_document_is_ordered() {
        let p = peripheral();
        let value: serde_json::Value = serde_json::from_str(&regmap_json(&p).unwrap()).unwrap();
        assert_eq!(value["address_width"], 1);
        let regs = value["registers"].as_array().unwrap();
        assert_eq!(regs[0]["name"], "INPUT");
        assert_eq!(regs[1]["name"], "OUTPUT");
        assert_eq!(regs[1]["byte_address"], 4);
        assert_eq!(regs[1]["access"], "W");
        assert_eq!(regs[1]["reset"], 255);
    }

    #[test]
    fn peripheral_document_carries_fingerprint() {
        let p = peripheral();
        let value: serde_json::Value = serde_json::from_str(&peripheral_json(&p).unwrap()).unwrap();
        assert_eq!(value["identity"]["name"], "iob_gpio");
        assert_eq!(value["fingerprint"].as_str().unwrap().len(), 64);
        assert_eq!(value["registers"]["total_words"], 2);
    }

    #[test]
    fn macro_lines() {
        let text = format_macros(&peripheral());
        assert!(text.contains("#define IOB_GPIO_SWREG_ADDR_W 1"));
        assert!(text.contains("IOB_GPIO_OUTPUT_ADDR"));
        assert!(text.lines().any(|l| l.starts_with("#define IOB_GPIO_OUTPUT_W") && l.ends_with(" 32")));
    }

    #[test]
    fn text_report_sections() {
        let text = format_text(&peripheral());
        assert!(text.starts_with("iob_gpio V0.10"));
        assert!(text.contains("=== Parameters ==="));
        assert!(text.contains("=== Register Map ==="));
        assert!(text.contains("│ gpio  │ OUTPUT   │ W      │ 32    │ 1    │ 0x4  │ 0xff  │"));
        assert!(!text.contains("Warnings"));
    }
}
