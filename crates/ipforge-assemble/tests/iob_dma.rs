//! End-to-end assembly of the shipped `iob_dma` descriptor.

use ipforge_assemble::output::{format_macros, regmap_json};
use ipforge_assemble::{assemble_all, Assembler, AssemblyOptions, Flow, PeripheralDecl, Stage};
use ipforge_core::error::DescriptorError;
use ipforge_core::port::Direction;
use ipforge_core::register::Access;
use ipforge_registry::{InterfaceRegistry, MemoryCatalog};

const DESCRIPTOR: &str = include_str!("../../../descriptors/iob_dma.toml");
const UPSTREAM: &str = include_str!("../../../descriptors/iob_dma_upstream.toml");
const CATALOG: &str = include_str!("../../../catalog/iob_components.toml");

fn catalog() -> MemoryCatalog {
    MemoryCatalog::from_toml(CATALOG).unwrap()
}

fn descriptor() -> PeripheralDecl {
    PeripheralDecl::parse(DESCRIPTOR).unwrap()
}

#[test]
fn identity_and_flows() {
    let decl = descriptor();
    assert_eq!(decl.name(), "iob_dma");
    assert_eq!(decl.identity().version, "V0.10");
    assert!(decl.identity().flows.contains(Flow::Sim));
    assert!(decl.identity().flows.contains(Flow::Emb));
    assert!(!decl.identity().flows.contains(Flow::Fpga));
}

#[test]
fn register_map_layout() {
    let catalog = catalog();
    let interfaces = InterfaceRegistry::builtin();
    let dma = Assembler::new(&catalog, &interfaces).assemble(&descriptor()).unwrap();

    let map = dma.registers();
    let layout: Vec<(&str, u64, Access)> = map
        .entries
        .iter()
        .map(|e| (e.name.as_str(), e.address, e.access))
        .collect();
    assert_eq!(
        layout,
        vec![
            ("BASE_ADDR", 0, Access::WriteOnly),
            ("TRANSFER_SIZE_LOG2", 1, Access::WriteOnly),
            ("DIRECTION", 2, Access::WriteOnly),
            ("INTERFACE_NUM", 3, Access::WriteOnly),
            ("READY_R", 4, Access::ReadOnly),
            ("READY_W", 5, Access::ReadOnly),
        ]
    );
    assert_eq!(map.total_words, 6);
    assert_eq!(map.min_address_width, 3);
    assert!(map.entries.iter().all(|e| e.autoreg && e.reset == 0));
}

#[test]
fn parameters_resolve_through_address_width() {
    let catalog = catalog();
    let interfaces = InterfaceRegistry::builtin();
    let dma = Assembler::new(&catalog, &interfaces).assemble(&descriptor()).unwrap();

    let params = dma.parameters();
    assert_eq!(params.get("DATA_W"), Some(32));
    assert_eq!(params.get("ADDR_W"), Some(3));
    assert_eq!(params.get("AXI_DATA_W"), Some(32));
    assert_eq!(params.get("BUFFER_W"), Some(1));
    assert_eq!(params.len(), 12);
    assert_eq!(dma.derived_macros().get("IOB_DMA_SWREG_ADDR_W"), Some(&3));
    // BUFFER_W matches its documented BURST_W+1 at the default BURST_W.
    assert!(dma.warnings().is_empty());
}

#[test]
fn submodules_keep_both_ram_purposes() {
    let catalog = catalog();
    let interfaces = InterfaceRegistry::builtin();
    let dma = Assembler::new(&catalog, &interfaces).assemble(&descriptor()).unwrap();

    let subs = dma.submodules();
    let labels: Vec<&str> = subs.instances.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "iob_reg",
            "iob_reg_e",
            "axis2axi",
            "iob_mux",
            "iob_demux",
            "iob_ram_2p[purpose=simulation]",
            "iob_ram_2p[purpose=fpga]",
        ]
    );
    assert_eq!(subs.instances_of("iob_ram_2p").count(), 2);
    let markers: Vec<&str> = subs.interfaces.iter().map(|i| i.marker.as_str()).collect();
    assert_eq!(markers, vec!["iob_s_port", "iob_s_portmap", "axi_m_port"]);
}

#[test]
fn ports_are_flattened_with_provenance() {
    let catalog = catalog();
    let interfaces = InterfaceRegistry::builtin();
    let dma = Assembler::new(&catalog, &interfaces).assemble(&descriptor()).unwrap();

    let ports = dma.ports();
    let groups: Vec<&str> = ports.groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(groups, vec!["iob_s_port", "general", "axi_m_port", "dma_input", "dma_output"]);
    assert_eq!(ports.signals.len(), 7 + 3 + 37 + 3 + 3);

    let first: Vec<&str> = ports.signals.iter().take(3).map(|s| s.name.as_str()).collect();
    assert_eq!(first, vec!["iob_valid_i", "iob_addr_i", "iob_wdata_i"]);

    let addr = ports.signals.iter().find(|s| s.name == "iob_addr_i").unwrap();
    assert_eq!(addr.width, 3);
    assert_eq!(addr.interface.as_deref(), Some("iob_s_port"));

    let tdata = ports.signals.iter().find(|s| s.name == "tdata_i").unwrap();
    assert_eq!((tdata.width, tdata.group.as_str()), (32, "dma_input"));
    let tready = ports.signals.iter().find(|s| s.name == "tready_o").unwrap();
    assert_eq!(tready.direction, Direction::Out);

    let awid = ports.signals.iter().find(|s| s.name == "axi_awid_o").unwrap();
    assert_eq!(awid.width, 1);
    let wstrb = ports.signals.iter().find(|s| s.name == "axi_wstrb_o").unwrap();
    assert_eq!(wstrb.width, 4);
}

#[test]
fn version_register_extends_map() {
    let catalog = catalog();
    let interfaces = InterfaceRegistry::builtin();
    let options = AssemblyOptions {
        version_register: true,
        ..AssemblyOptions::default()
    };
    let dma = Assembler::new(&catalog, &interfaces)
        .with_options(options)
        .assemble(&descriptor())
        .unwrap();
    let version = dma.registers().get("VERSION").unwrap();
    assert_eq!((version.address, version.width, version.reset), (6, 16, 0x0010));
    assert_eq!(dma.registers().total_words, 7);
    assert_eq!(dma.parameters().get("ADDR_W"), Some(3));
    let line = format_macros(&dma)
        .lines()
        .find(|l| l.starts_with("#define IOB_DMA_VERSION_ADDR "))
        .map(|l| l.split_whitespace().last().unwrap_or_default().to_string());
    assert_eq!(line.as_deref(), Some("24"));
}

#[test]
fn upstream_axi_id_default_is_out_of_bounds() {
    let decl = PeripheralDecl::parse(UPSTREAM).unwrap();
    assert_eq!(decl.parameters().len(), descriptor().parameters().len());
    let catalog = catalog();
    let interfaces = InterfaceRegistry::builtin();
    let err = Assembler::new(&catalog, &interfaces).assemble(&decl).unwrap_err();
    assert_eq!(err.stage, Stage::Parameters);
    assert_eq!(
        err.source,
        DescriptorError::OutOfBounds {
            name: "AXI_ID_W".to_string(),
            value: 0,
            min: Some(1),
            max: Some(32),
        }
    );
}

#[test]
fn tdata_bounded_by_data_width() {
    let wide = DESCRIPTOR.replacen(
        "name = \"TDATA_W\"\nkind = \"P\"\ndefault = 32",
        "name = \"TDATA_W\"\nkind = \"P\"\ndefault = 64",
        1,
    );
    let decl = PeripheralDecl::parse(&wide).unwrap();
    let catalog = catalog();
    let interfaces = InterfaceRegistry::builtin();
    let err = Assembler::new(&catalog, &interfaces).assemble(&decl).unwrap_err();
    assert!(matches!(
        err.source,
        DescriptorError::OutOfBounds { ref name, value: 64, max: Some(32), .. } if name == "TDATA_W"
    ));
}

#[test]
fn cross_group_signal_collision() {
    let doc = format!(
        "{DESCRIPTOR}\n[[ports]]\nname = \"debug\"\nsignals = [{{ name = \"clk_i\", direction = \"I\", width = 1 }}]\n"
    );
    let decl = PeripheralDecl::parse(&doc).unwrap();
    let catalog = catalog();
    let interfaces = InterfaceRegistry::builtin();
    let err = Assembler::new(&catalog, &interfaces).assemble(&decl).unwrap_err();
    assert_eq!(err.stage, Stage::Ports);
    assert_eq!(
        err.source,
        DescriptorError::DuplicateSignalName {
            signal: "clk_i".to_string(),
            first_group: "general".to_string(),
            second_group: "debug".to_string(),
        }
    );
}

#[test]
fn missing_component_is_unresolved() {
    let decl = descriptor();
    let empty = MemoryCatalog::new();
    let interfaces = InterfaceRegistry::builtin();
    let err = Assembler::new(&empty, &interfaces).assemble(&decl).unwrap_err();
    assert_eq!(err.stage, Stage::Submodules);
    match err.source {
        DescriptorError::UnresolvedComponent { name, position, .. } => {
            assert_eq!(name, "iob_reg");
            assert_eq!(position, 3);
        }
        other => panic!("expected UnresolvedComponent, got {other:?}"),
    }
}

#[test]
fn regmap_document_and_macros() {
    let catalog = catalog();
    let interfaces = InterfaceRegistry::builtin();
    let dma = Assembler::new(&catalog, &interfaces).assemble(&descriptor()).unwrap();

    let doc: serde_json::Value = serde_json::from_str(&regmap_json(&dma).unwrap()).unwrap();
    assert_eq!(doc["peripheral"], "iob_dma");
    assert_eq!(doc["address_width"], 3);
    assert_eq!(doc["registers"][5]["name"], "READY_W");
    assert_eq!(doc["registers"][5]["byte_address"], 20);

    let macros = dma.macros();
    let lookup = |name: &str| macros.iter().find(|m| m.name == name).map(|m| m.value);
    assert_eq!(lookup("IOB_DMA_SWREG_ADDR_W"), Some(3));
    assert_eq!(lookup("IOB_DMA_BASE_ADDR_ADDR"), Some(0));
    assert_eq!(lookup("IOB_DMA_TRANSFER_SIZE_LOG2_ADDR"), Some(4));
    assert_eq!(lookup("IOB_DMA_INTERFACE_NUM_W"), Some(16));
}

#[test]
fn reassembly_is_identical() {
    let catalog = catalog();
    let interfaces = InterfaceRegistry::builtin();
    let assembler = Assembler::new(&catalog, &interfaces);
    let a = assembler.assemble(&descriptor()).unwrap();
    let b = assembler.assemble(&descriptor()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.fingerprint(), b.fingerprint());
}

#[test]
fn batch_isolates_the_broken_descriptor() {
    let broken = PeripheralDecl::parse(&DESCRIPTOR.replacen("default = \"DATA_W\"", "default = \"DATA_WIDTH\"", 1)).unwrap();
    let decls = vec![descriptor(), broken, descriptor()];
    let catalog = catalog();
    let interfaces = InterfaceRegistry::builtin();
    let assembler = Assembler::new(&catalog, &interfaces);

    let results = assemble_all(&assembler, &decls);
    assert!(results[0].is_ok());
    let err = results[1].as_ref().unwrap_err();
    assert!(matches!(err.source, DescriptorError::UndefinedParameterReference { ref reference, .. } if reference == "DATA_WIDTH"));
    assert_eq!(results[2].as_ref().unwrap(), results[0].as_ref().unwrap());
}

#[test]
fn load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("iob_dma.toml");
    std::fs::write(&path, DESCRIPTOR).unwrap();
    assert_eq!(PeripheralDecl::load(&path).unwrap(), descriptor());
}
