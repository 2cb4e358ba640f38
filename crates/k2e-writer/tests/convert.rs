use std::path::PathBuf;

use k2e_sexpr::{SexprError, parse_str};
use k2e_writer::{ConvertError, ConverterConfig, Side, convert, convert_str, scan_pad_names};

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(workspace_root().join("fixtures/footprints").join(name)).unwrap()
}

fn net_pairs(conversion: &k2e_writer::Conversion) -> Vec<(&str, &str)> {
    conversion
        .net_map
        .iter()
        .map(|(pad, net)| (pad.as_str(), net.as_str()))
        .collect()
}

fn position(code: &str, needle: &str) -> usize {
    code.find(needle)
        .unwrap_or_else(|| panic!("`{needle}` missing from:\n{code}"))
}

#[test]
fn converts_minimal_footprint_exactly() {
    let src = r#"(footprint "T" (layer "F.Cu") (uuid "u") (attr smd)
        (pad "1" smd rect (at 1 0) (layers "F.Cu"))
        (fp_line (start 0 0) (end 1 0) (layer "F.SilkS"))
        (property "Reference" "R1"))"#;
    let conversion = convert_str(src, &ConverterConfig::default()).unwrap();

    let expected = r##"module.exports = {
  params: {
    designator: 'XX',
    side: 'F',
    P1: { type: 'net', value: undefined },
  },
  body: p => {
    const fp = [];
    const flip = p.side === "B";
if (!flip && p.side !== "F") throw new Error('unsupported side: ' + p.side);

fp.push(`(footprint "T"`);
fp.push(p.at);
fp.push(`(layer "${(flip ? "B.Cu" : "F.Cu")}")`);

fp.push(`(attr smd)`);

// Unknown

// Pads
fp.push(`(pad "1" smd rect (at ${(flip ? -1 : 1)} 0 ${p.r}) (layers "${(flip ? "B" : "F")}.Cu") ${p.P1})`);

// Drawings on F.SilkS
fp.push(`(fp_line (start ${(flip ? -0 : 0)} 0) (end ${(flip ? -1 : 1)} 0) (layer "${(flip ? "B.SilkS" : "F.SilkS")}"))`);

// Properties
// fp.push(`(property "Reference" "R1")`);
    fp.push(')');
    return fp.join('\n');
  }
}
"##;
    assert_eq!(conversion.code, expected);
    assert_eq!(conversion.default_side, Side::Front);
    assert_eq!(net_pairs(&conversion), [("1", "P1")]);
}

#[test]
fn front_resistor_fixture() {
    let conversion =
        convert_str(&fixture("R_0603_front.kicad_mod"), &ConverterConfig::default()).unwrap();
    let code = &conversion.code;

    assert_eq!(conversion.default_side, Side::Front);
    assert_eq!(net_pairs(&conversion), [("1", "P1"), ("2", "P2")]);
    assert!(code.contains("    P1: { type: 'net', value: undefined },\n    P2:"));
    assert!(code.contains(r#"(pad "2" smd roundrect (at ${(flip ? -0.825 : 0.825)} 0 ${p.r})"#));

    for provenance in ["uuid", "(version", "generator", "20240108"] {
        assert!(!code.contains(provenance), "{provenance} leaked into output");
    }

    let pads = position(code, "// Pads\n");
    let courtyard = position(code, "// Drawings on F.CrtYd\n");
    let fab = position(code, "// Drawings on F.Fab\n");
    let silk = position(code, "// Drawings on F.SilkS\n");
    let models = position(code, "// 3D Models\n");
    let properties = position(code, "// Properties\n");
    assert!(pads < courtyard && courtyard < fab && fab < silk);
    assert!(silk < models && models < properties);

    assert!(code.contains(r#"// fp.push(`(property "Reference" "REF**""#));
    assert!(code.contains(r#"(fp_text user "\${REFERENCE}""#));
    assert!(code.contains(r#"(model "\${KICAD8_3DMODEL_DIR}/Resistor_SMD"#));
    assert!(code.contains(r#"(justify${ flip ? " mirror" : ""})"#));
}

#[test]
fn back_side_fixture() {
    let conversion =
        convert_str(&fixture("switch_back.kicad_mod"), &ConverterConfig::default()).unwrap();
    let code = &conversion.code;

    assert_eq!(conversion.default_side, Side::Back);
    assert!(code.contains("const flip = p.side === \"F\";\n"));
    assert!(code.contains("if (!flip && p.side !== \"B\")"));
    assert!(code.contains("    side: 'B',\n"));
    assert!(code.contains(r#"fp.push(`(layer "${(flip ? "F.Cu" : "B.Cu")}")`);"#));

    // the unconnected mounting hole gets no net, the repeated pad reuses its name
    assert_eq!(net_pairs(&conversion), [("1", "P1"), ("2", "P2")]);
    assert!(code.contains(r#"(pad "" np_thru_hole circle (at 0 0 ${p.r})"#));
    assert_eq!(code.matches("${p.P1})").count(), 2);
    assert!(!code.contains("ROW0"));
    assert!(!code.contains("COL0"));

    assert!(code.contains("// Unknown\nfp.push(`(embedded_fonts no)`);"));
    assert!(code.contains(r#"(justify${ flip ? "" : " mirror"})"#));
    assert!(code.contains("(at 0 -3.5 ${(((p.r + 180) % 360) + 360) % 360})"));
    assert!(code.contains("(xy ${(flip ? 1 : -1)} 4)"));
    assert!(code.contains("(net 0) (net_name \"\")"));

    let courtyard = position(code, "// Drawings on B.CrtYd\n");
    let fab = position(code, "// Drawings on B.Fab\n");
    let silk = position(code, "// Drawings on B.SilkS\n");
    let user = position(code, "// Drawings on Dwgs.User\n");
    let zones = position(code, "// Zones\n");
    assert!(courtyard < fab && fab < silk && silk < user && user < zones);
}

#[test]
fn legacy_module_fixture() {
    let conversion =
        convert_str(&fixture("legacy_module.kicad_mod"), &ConverterConfig::default()).unwrap();
    let code = &conversion.code;

    assert_eq!(conversion.default_side, Side::Front);
    assert!(code.contains("fp.push(`(module Diode_SMD:D_SOD-123`);\nfp.push(p.at);\n"));
    assert!(!code.contains("587F7769"));
    assert!(code.contains(r#"(pad "1" smd rect (at ${(flip ? 1.65 : -1.65)} 0 ${p.r})"#));
    assert!(code.contains(
        r#"(layers "${(flip ? "B" : "F")}.Cu" "${(flip ? "B" : "F")}.Paste" "${(flip ? "B" : "F")}.Mask")"#
    ));
    assert!(code.contains("(at (xyz 0 0 0))"));
    assert!(code.contains("(model \\${KISYS3DMOD}/Diode_SMD.3dshapes/D_SOD-123.wrl"));
    assert!(code.contains("// Drawings on F.SilkS\n"));
}

#[test]
fn config_file_renames_nets() {
    let yaml =
        std::fs::read_to_string(workspace_root().join("fixtures/config/overrides.yaml")).unwrap();
    let config = ConverterConfig::from_yaml_str(&yaml).unwrap();
    let conversion = convert_str(&fixture("switch_back.kicad_mod"), &config).unwrap();

    assert_eq!(net_pairs(&conversion), [("1", "from"), ("2", "to")]);
    assert!(conversion.code.contains("    designator: 'S',\n"));
    assert!(
        conversion
            .code
            .contains("    from: { type: 'net', value: undefined },\n    to: { type: 'net', value: undefined },\n")
    );
    assert!(conversion.code.contains("${p.from})"));
    assert!(!conversion.code.contains("PIN"));
}

#[test]
fn override_targets_are_reserved() {
    let mut config = ConverterConfig::default();
    config.net_name_overrides.insert("2".to_string(), "P1".to_string());
    let conversion = convert_str(&fixture("R_0603_front.kicad_mod"), &config).unwrap();

    assert_eq!(net_pairs(&conversion), [("1", "P1_1"), ("2", "P1")]);
    assert!(conversion.code.contains(
        "    P1: { type: 'net', value: undefined },\n    P1_1: { type: 'net', value: undefined },\n"
    ));
}

#[test]
fn non_identifier_nets_are_quoted() {
    let conversion = convert_str(
        r#"(footprint "x" (pad "B2" smd rect) (pad "A-1" smd rect))"#,
        &ConverterConfig::default(),
    )
    .unwrap();
    assert!(conversion.code.contains(
        "    \"A-1\": { type: 'net', value: undefined },\n    B2: { type: 'net', value: undefined },\n"
    ));
    assert!(conversion.code.contains(r#"(pad "A-1" smd rect ${p["A-1"]})"#));
}

#[test]
fn prefix_all_policy() {
    let config = ConverterConfig {
        prefix_number_pads_only: false,
        ..ConverterConfig::default()
    };
    let conversion =
        convert_str(r#"(footprint "x" (pad "A" smd rect) (pad "1" smd rect))"#, &config).unwrap();
    assert_eq!(net_pairs(&conversion), [("A", "PA"), ("1", "P1")]);
}

#[test]
fn conversion_is_deterministic() {
    for name in [
        "R_0603_front.kicad_mod",
        "switch_back.kicad_mod",
        "legacy_module.kicad_mod",
    ] {
        let text = fixture(name);
        let tree = parse_str(&text).unwrap();
        let first = convert(&tree, &ConverterConfig::default()).unwrap();
        let second = convert(&tree, &ConverterConfig::default()).unwrap();
        assert_eq!(first, second, "{name}");
    }
}

#[test]
fn scans_pad_names_in_source_order() {
    let tree = parse_str(&fixture("switch_back.kicad_mod")).unwrap();
    assert_eq!(scan_pad_names(&tree).unwrap(), ["1", "2"]);
}

#[test]
fn rejects_non_footprint_roots() {
    let err = convert_str("(kicad_pcb (version 20240108))", &ConverterConfig::default())
        .unwrap_err();
    assert!(matches!(err, ConvertError::NotAFootprint { ref kind } if kind == "kicad_pcb"));
}

#[test]
fn reports_malformed_nodes() {
    let err = convert_str(
        r#"(footprint "x" (fp_line (start 1) (end 0 0)))"#,
        &ConverterConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ConvertError::Shape { ref kind, .. } if kind == "start"));
    assert!(err.to_string().contains("(start ...)"));
}

#[test]
fn reports_parse_errors() {
    let err = convert_str(r#"(footprint "x" (pad "1""#, &ConverterConfig::default()).unwrap_err();
    assert!(matches!(err, ConvertError::Sexpr(SexprError::UnexpectedEof { .. })));

    let err = convert_str("(footprint a) (extra)", &ConverterConfig::default()).unwrap_err();
    assert!(matches!(err, ConvertError::Sexpr(SexprError::TrailingTokens { .. })));
}

#[test]
fn multi_line_properties_stay_commented() {
    let conversion = convert_str(
        "(footprint \"T\" (layer \"F.Cu\")\n  (property \"Description\" \"line one\nline two\"))",
        &ConverterConfig::default(),
    )
    .unwrap();
    assert!(conversion.code.contains(
        "// Properties\n// fp.push(`(property \"Description\" \"line one\n// line two\")`);\n"
    ));
    assert!(!conversion.code.contains("\nline two"));
}
