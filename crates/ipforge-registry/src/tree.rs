//! Submodule tree display.
//!
//! ```text
//! iob_dma V0.10
//! ├── iob_s_port (interface 1.0.0)
//! ├── iob_reg V0.10
//! ├── iob_ram_2p[purpose=fpga] V0.10
//! │   └── ADDR_W = 10
//! └── axi_m_port (interface 1.0.0)
//! ```

use crate::resolution::ResolvedSubmodules;

enum Line<'a> {
    Interface(&'a str, &'a str),
    Instance(&'a crate::resolution::ResolvedInstance),
}

/// Format resolved submodules as a tree, entries in declaration order.
pub fn format_tree(root_name: &str, root_version: &str, resolved: &ResolvedSubmodules) -> String {
    let mut out = format!("{root_name} {root_version}\n");

    let mut lines: Vec<(usize, Line<'_>)> = resolved
        .interfaces
        .iter()
        .map(|i| (i.position, Line::Interface(&i.marker, &i.version)))
        .chain(resolved.instances.iter().map(|i| (i.position, Line::Instance(i))))
        .collect();
    lines.sort_by_key(|(position, _)| *position);

    let count = lines.len();
    for (n, (_, line)) in lines.iter().enumerate() {
        let is_last = n + 1 == count;
        let connector = if is_last { "└── " } else { "├── " };
        let child_prefix = if is_last { "    " } else { "│   " };
        match line {
            Line::Interface(marker, version) => {
                out.push_str(&format!("{connector}{marker} (interface {version})\n"));
            }
            Line::Instance(inst) => {
                out.push_str(&format!("{connector}{} {}\n", inst.label, inst.version));
                let overrides = inst.overrides.len();
                for (k, (name, value)) in inst.overrides.iter().enumerate() {
                    let child = if k + 1 == overrides { "└── " } else { "├── " };
                    out.push_str(&format!("{child_prefix}{child}{name} = {value}\n"));
                }
            }
        }
    }

    out.push_str(&format!(
        "\n{} submodules ({} components, {} interfaces)\n",
        resolved.len(),
        resolved.instances.len(),
        resolved.interfaces.len()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolution::{ResolvedInstance, ResolvedInterface};
    use ipforge_core::expr::Expr;
    use std::collections::BTreeMap;

    fn instance(label: &str, position: usize) -> ResolvedInstance {
        ResolvedInstance {
            component: label.to_string(),
            label: label.to_string(),
            options: BTreeMap::new(),
            version: "V0.10".to_string(),
            position,
            overrides: BTreeMap::new(),
            parameters: Vec::new(),
            ports: Vec::new(),
        }
    }

    #[test]
    fn interleaves_by_position() {
        let resolved = ResolvedSubmodules {
            instances: vec![instance("iob_reg", 1), instance("iob_mux", 3)],
            interfaces: vec![
                ResolvedInterface {
                    marker: "iob_s_port".to_string(),
                    version: "1.0.0".to_string(),
                    position: 0,
                },
                ResolvedInterface {
                    marker: "axi_m_port".to_string(),
                    version: "1.0.0".to_string(),
                    position: 2,
                },
            ],
        };
        let output = format_tree("iob_dma", "V0.10", &resolved);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "iob_dma V0.10");
        assert_eq!(lines[1], "├── iob_s_port (interface 1.0.0)");
        assert_eq!(lines[2], "├── iob_reg V0.10");
        assert_eq!(lines[3], "├── axi_m_port (interface 1.0.0)");
        assert_eq!(lines[4], "└── iob_mux V0.10");
        assert!(output.contains("4 submodules (2 components, 2 interfaces)"));
    }

    #[test]
    fn overrides_are_children() {
        let mut ram = instance("iob_ram_2p[purpose=fpga]", 0);
        ram.overrides.insert("ADDR_W".to_string(), Expr::literal(10));
        ram.overrides.insert("DATA_W".to_string(), Expr::literal(32));
        let resolved = ResolvedSubmodules {
            instances: vec![ram],
            interfaces: Vec::new(),
        };
        let output = format_tree("top", "V1.0", &resolved);
        assert!(output.contains("└── iob_ram_2p[purpose=fpga] V0.10"));
        assert!(output.contains("    ├── ADDR_W = 10"));
        assert!(output.contains("    └── DATA_W = 32"));
    }

    #[test]
    fn empty_tree() {
        let output = format_tree("empty", "V0.1", &ResolvedSubmodules::default());
        assert!(output.starts_with("empty V0.1\n"));
        assert!(output.contains("0 submodules"));
    }
}
