//! Logical interface templates.
//!
//! Interface markers (`iob_s_port`, `axi_m_port`, ...) stand for standard bus
//! protocols. The registry maps each marker to its canonical signal list with
//! widths written against the instantiating peripheral's parameters.

use std::collections::BTreeMap;

use ipforge_core::expr::Expr;
use ipforge_core::port::{Direction, InterfaceTemplate, InterfaceTemplates, Signal};

/// Version stamped on the built-in templates.
pub const BUILTIN_VERSION: &str = "1.0.0";

/// Marker to template map.
#[derive(Debug, Clone, Default)]
pub struct InterfaceRegistry {
    templates: BTreeMap<String, InterfaceTemplate>,
}

impl InterfaceRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the IOb native and AXI4 templates.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(iob_native("iob_s_port", "CPU native interface (subordinate)"));
        registry.register(iob_native(
            "iob_s_portmap",
            "CPU native interface (subordinate), instantiation port map",
        ));
        registry.register(axi_master());
        registry
    }

    /// Add or replace a template.
    pub fn register(&mut self, template: InterfaceTemplate) -> Option<InterfaceTemplate> {
        self.templates.insert(template.name.clone(), template)
    }

    pub fn contains(&self, marker: &str) -> bool {
        self.templates.contains_key(marker)
    }

    /// Known markers, sorted.
    pub fn markers(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }
}

impl InterfaceTemplates for InterfaceRegistry {
    fn template(&self, marker: &str) -> Option<&InterfaceTemplate> {
        self.templates.get(marker)
    }
}

fn sig(name: &str, direction: Direction, width: &str, description: &str) -> Signal {
    // Template widths are constant text; a parse failure shows up as width 1.
    let width = Expr::parse(width).unwrap_or_else(|_| Expr::literal(1));
    Signal::new(name, direction, width, description)
}

fn iob_native(name: &str, description: &str) -> InterfaceTemplate {
    use Direction::{In, Out};
    InterfaceTemplate {
        name: name.to_string(),
        version: BUILTIN_VERSION.to_string(),
        description: description.to_string(),
        signals: vec![
            sig("iob_valid_i", In, "1", "Request valid."),
            sig("iob_addr_i", In, "ADDR_W", "Address."),
            sig("iob_wdata_i", In, "DATA_W", "Write data."),
            sig("iob_wstrb_i", In, "DATA_W/8", "Write strobe."),
            sig("iob_rvalid_o", Out, "1", "Read data valid."),
            sig("iob_rdata_o", Out, "DATA_W", "Read data."),
            sig("iob_ready_o", Out, "1", "Interface ready."),
        ],
    }
}

fn axi_master() -> InterfaceTemplate {
    use Direction::{In, Out};
    let mut signals = Vec::new();
    for ch in ["aw", "ar"] {
        signals.extend([
            sig(&format!("axi_{ch}id_o"), Out, "AXI_ID_W", "Address channel ID."),
            sig(&format!("axi_{ch}addr_o"), Out, "AXI_ADDR_W", "Address."),
            sig(&format!("axi_{ch}len_o"), Out, "AXI_LEN_W", "Burst length."),
            sig(&format!("axi_{ch}size_o"), Out, "3", "Burst size."),
            sig(&format!("axi_{ch}burst_o"), Out, "2", "Burst type."),
            sig(&format!("axi_{ch}lock_o"), Out, "2", "Lock type."),
            sig(&format!("axi_{ch}cache_o"), Out, "4", "Memory type."),
            sig(&format!("axi_{ch}prot_o"), Out, "3", "Protection type."),
            sig(&format!("axi_{ch}qos_o"), Out, "4", "Quality of service."),
            sig(&format!("axi_{ch}valid_o"), Out, "1", "Address valid."),
            sig(&format!("axi_{ch}ready_i"), In, "1", "Address ready."),
        ]);
        if ch == "aw" {
            signals.extend([
                sig("axi_wdata_o", Out, "AXI_DATA_W", "Write data."),
                sig("axi_wstrb_o", Out, "AXI_DATA_W/8", "Write strobe."),
                sig("axi_wlast_o", Out, "1", "Last write transfer."),
                sig("axi_wvalid_o", Out, "1", "Write valid."),
                sig("axi_wready_i", In, "1", "Write ready."),
                sig("axi_bid_i", In, "AXI_ID_W", "Write response ID."),
                sig("axi_bresp_i", In, "2", "Write response."),
                sig("axi_bvalid_i", In, "1", "Write response valid."),
                sig("axi_bready_o", Out, "1", "Write response ready."),
            ]);
        }
    }
    signals.extend([
        sig("axi_rid_i", In, "AXI_ID_W", "Read ID."),
        sig("axi_rdata_i", In, "AXI_DATA_W", "Read data."),
        sig("axi_rresp_i", In, "2", "Read response."),
        sig("axi_rlast_i", In, "1", "Last read transfer."),
        sig("axi_rvalid_i", In, "1", "Read valid."),
        sig("axi_rready_o", Out, "1", "Read ready."),
    ]);

    InterfaceTemplate {
        name: "axi_m_port".to_string(),
        version: BUILTIN_VERSION.to_string(),
        description: "AXI4 manager interface".to_string(),
        signals,
    }
}
