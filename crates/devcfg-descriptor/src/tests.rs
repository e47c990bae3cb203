use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::{model_for_code, model_for_name, models, DeviceFamily, OutputSignal};
use crate::errors::DescriptorError;
use crate::fieldtypes::{FieldTypeRegistry, ValueShape};
use crate::model::{DefaultValue, FieldType, LocaleMap, VariableInfo};
use crate::period::{format_period, parse_period};
use crate::wire::{load_descriptor, load_descriptor_with, to_json_string};

fn fixture(path: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let full_path = base.join("tests/data").join(path);
    fs::read_to_string(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

#[test]
fn loads_smp_descriptor() {
    let content = fixture("knz_smp.cfg");
    let descriptor = load_descriptor(&content).expect("SMP descriptor load failed");

    assert_eq!(descriptor.product_name, "knz.smp");
    assert!(descriptor.supports.is_empty());
    assert_eq!(descriptor.parameters.child_order(), ["root", "outputs"]);

    let outputs = descriptor.group("outputs").expect("missing outputs group");
    assert_eq!(outputs.child_order(), ["Irr", "temp"]);

    let irr = descriptor.group("outputs.Irr").expect("missing Irr group");
    assert_eq!(
        irr.variable,
        Some(VariableInfo {
            var_type: "irradiance".to_string(),
            units: "W/m2".to_string(),
        })
    );
    assert_eq!(
        irr.description
            .as_ref()
            .expect("missing Irr description")
            .resolve("*")
            .unwrap(),
        "solar irradiance"
    );

    // Sections carry no measurable quantity themselves.
    assert!(descriptor.parameters.variable.is_none());
    assert!(descriptor.group("root").unwrap().variable.is_none());
}

#[test]
fn default_values_flatten_the_tree() {
    let content = fixture("knz_smp.cfg");
    let descriptor = load_descriptor(&content).expect("SMP descriptor load failed");

    let mut expected = BTreeMap::new();
    expected.insert(
        "outputs.Irr.delta_min".to_string(),
        DefaultValue::Float(5.0),
    );
    expected.insert(
        "outputs.temp.delta_min".to_string(),
        DefaultValue::Float(0.5),
    );
    expected.insert(
        "root.polling".to_string(),
        DefaultValue::Text("1m".to_string()),
    );
    expected.insert(
        "root.events_ttl".to_string(),
        DefaultValue::Text("2h".to_string()),
    );

    assert_eq!(descriptor.default_values(), expected);
}

#[test]
fn resolve_label_prefers_exact_locale() {
    let content = fixture("knz_smp.cfg");
    let descriptor = load_descriptor(&content).expect("SMP descriptor load failed");

    let polling = descriptor
        .field("root.polling")
        .expect("missing polling field");
    assert_eq!(polling.label.resolve("fr").unwrap(), "Période de scrutation");
    assert_eq!(polling.label.resolve("de").unwrap(), "Polling period");
    assert_eq!(polling.label.resolve("*").unwrap(), "Polling period");

    assert_eq!(
        descriptor.description.resolve("fr").unwrap(),
        "Pyranomètre série SMP"
    );

    let bare = LocaleMap::from_wildcard("root.polling", "Polling period");
    assert_eq!(bare.resolve("fr").unwrap(), "Polling period");
}

#[test]
fn round_trip_preserves_model() {
    let content = fixture("knz_smp.cfg");
    let descriptor = load_descriptor(&content).expect("initial load failed");

    let dumped = to_json_string(&descriptor).expect("serialization failed");
    let restored = load_descriptor(&dumped).expect("reload of dumped descriptor failed");

    assert_eq!(descriptor, restored);
}

#[test]
fn field_path_lookup_distinguishes_nodes() {
    let content = fixture("knz_smp.cfg");
    let descriptor = load_descriptor(&content).expect("SMP descriptor load failed");

    let delta = descriptor
        .field("outputs.Irr.delta_min")
        .expect("missing delta_min field");
    assert_eq!(delta.field_type, FieldType::Float);
    assert_eq!(delta.default, DefaultValue::Float(5.0));

    assert!(descriptor.field("outputs.Irr").is_none());
    assert!(descriptor.group("outputs.Irr.delta_min").is_none());
    assert!(descriptor.node("outputs.Hum").is_none());
    assert!(descriptor.node("").is_none());
}

#[test]
fn missing_productname_is_malformed() {
    let content = fixture("knz_smp.cfg");
    let mutated = content.replacen("\"productname\"", "\"productlabel\"", 1);

    match load_descriptor(&mutated) {
        Err(DescriptorError::MalformedDescriptor { reason }) => {
            assert!(reason.contains("productname"), "unexpected reason: {reason}");
        }
        other => panic!("expected MalformedDescriptor, got {other:?}"),
    }
}

#[test]
fn empty_productname_is_malformed() {
    let content = fixture("knz_smp.cfg");
    let mutated = content.replacen("\"knz.smp\"", "\"\"", 1);

    match load_descriptor(&mutated) {
        Err(DescriptorError::MalformedDescriptor { .. }) => {}
        other => panic!("expected MalformedDescriptor, got {other:?}"),
    }
}

#[test]
fn incomplete_child_order_is_rejected() {
    let content = fixture("knz_smp.cfg");
    let mutated = content.replacen(
        r#""__seq__": ["Irr", "temp"]"#,
        r#""__seq__": ["Irr"]"#,
        1,
    );

    match load_descriptor(&mutated) {
        Err(DescriptorError::InconsistentOrdering { group, detail }) => {
            assert_eq!(group, "outputs");
            assert!(detail.contains("temp"), "unexpected detail: {detail}");
        }
        other => panic!("expected InconsistentOrdering, got {other:?}"),
    }
}

#[test]
fn undefined_child_order_entry_is_rejected() {
    let content = fixture("knz_smp.cfg");
    let mutated = content.replacen(
        r#""__seq__": ["Irr", "temp"]"#,
        r#""__seq__": ["Irr", "temp", "hum"]"#,
        1,
    );

    match load_descriptor(&mutated) {
        Err(DescriptorError::InconsistentOrdering { group, detail }) => {
            assert_eq!(group, "outputs");
            assert!(detail.contains("hum"), "unexpected detail: {detail}");
        }
        other => panic!("expected InconsistentOrdering, got {other:?}"),
    }
}

#[test]
fn duplicate_child_order_entry_is_rejected() {
    let content = fixture("knz_smp.cfg");
    let mutated = content.replacen(
        r#""__seq__": ["root", "outputs"]"#,
        r#""__seq__": ["root", "root", "outputs"]"#,
        1,
    );

    match load_descriptor(&mutated) {
        Err(DescriptorError::InconsistentOrdering { group, .. }) => {
            assert_eq!(group, "pdefs");
        }
        other => panic!("expected InconsistentOrdering, got {other:?}"),
    }
}

#[test]
fn missing_child_order_is_malformed() {
    let document = r#"{
        "productname": "acme.probe",
        "__descr__": {"*": "probe"},
        "pdefs": {
            "__seq__": ["root"],
            "root": {
                "polling": {
                    "type": "period",
                    "label": {"*": "Polling period"},
                    "defvalue": "1m"
                }
            }
        }
    }"#;

    match load_descriptor(document) {
        Err(DescriptorError::MalformedDescriptor { reason }) => {
            assert!(reason.contains("__seq__"), "unexpected reason: {reason}");
        }
        other => panic!("expected MalformedDescriptor, got {other:?}"),
    }
}

#[test]
fn unknown_field_type_is_rejected() {
    let content = fixture("knz_smp.cfg");
    let mutated = content.replacen("\"type\": \"period\"", "\"type\": \"quaternion\"", 1);

    match load_descriptor(&mutated) {
        Err(DescriptorError::UnknownFieldType { path, tag }) => {
            assert_eq!(path, "root.polling");
            assert_eq!(tag, "quaternion");
        }
        other => panic!("expected UnknownFieldType, got {other:?}"),
    }
}

#[test]
fn registered_extension_type_loads() {
    let document = r#"{
        "productname": "acme.probe",
        "__descr__": {"*": "probe"},
        "supports": [],
        "pdefs": {
            "__seq__": ["root"],
            "root": {
                "__seq__": ["address"],
                "address": {
                    "type": "address",
                    "label": {"*": "Unit address"},
                    "defvalue": 52
                }
            }
        }
    }"#;

    match load_descriptor(document) {
        Err(DescriptorError::UnknownFieldType { tag, .. }) => assert_eq!(tag, "address"),
        other => panic!("expected UnknownFieldType, got {other:?}"),
    }

    let mut registry = FieldTypeRegistry::builtin();
    registry.register("address", ValueShape::Integer);
    assert!(registry.recognizes("address"));
    let descriptor =
        load_descriptor_with(document, &registry).expect("extension type load failed");

    let address = descriptor.field("root.address").expect("missing field");
    assert_eq!(address.field_type, FieldType::Extension("address".to_string()));
    assert_eq!(address.default, DefaultValue::Int(52));
}

#[test]
fn label_without_wildcard_is_rejected() {
    let content = fixture("knz_smp.cfg");
    let mutated = content.replacen(
        r#""*": "Polling period",
                    "#,
        "",
        1,
    );

    match load_descriptor(&mutated) {
        Err(DescriptorError::MissingWildcardLabel { path }) => {
            assert_eq!(path, "root.polling");
        }
        other => panic!("expected MissingWildcardLabel, got {other:?}"),
    }
}

#[test]
fn unpaired_variable_units_is_malformed() {
    let content = fixture("knz_smp.cfg");
    let mutated = content.replacen(
        r#""__varunits__": "W/m2",
                "#,
        "",
        1,
    );

    match load_descriptor(&mutated) {
        Err(DescriptorError::MalformedDescriptor { reason }) => {
            assert!(reason.contains("__varunits__"), "unexpected reason: {reason}");
        }
        other => panic!("expected MalformedDescriptor, got {other:?}"),
    }
}

#[test]
fn period_default_must_parse() {
    let content = fixture("knz_smp.cfg");
    let mutated = content.replacen("\"defvalue\": \"1m\"", "\"defvalue\": \"soon\"", 1);

    match load_descriptor(&mutated) {
        Err(DescriptorError::InvalidDefault { path, tag, .. }) => {
            assert_eq!(path, "root.polling");
            assert_eq!(tag, "period");
        }
        other => panic!("expected InvalidDefault, got {other:?}"),
    }
}

#[test]
fn float_default_must_be_numeric() {
    let content = fixture("knz_smp.cfg");
    let mutated = content.replacen("\"defvalue\": 5", "\"defvalue\": \"five\"", 1);

    match load_descriptor(&mutated) {
        Err(DescriptorError::InvalidDefault { path, tag, .. }) => {
            assert_eq!(path, "outputs.Irr.delta_min");
            assert_eq!(tag, "float");
        }
        other => panic!("expected InvalidDefault, got {other:?}"),
    }
}

#[test]
fn unsupported_field_key_is_malformed() {
    let content = fixture("knz_smp.cfg");
    let mutated = content.replacen(
        "\"defvalue\": \"1m\"",
        "\"defvalue\": \"1m\",\n                \"maxvalue\": \"1h\"",
        1,
    );

    match load_descriptor(&mutated) {
        Err(DescriptorError::MalformedDescriptor { reason }) => {
            assert!(reason.contains("maxvalue"), "unexpected reason: {reason}");
        }
        other => panic!("expected MalformedDescriptor, got {other:?}"),
    }
}

#[test]
fn supports_defaults_to_empty() {
    let document = r#"{
        "productname": "acme.probe",
        "__descr__": {"*": "probe"},
        "pdefs": {
            "__seq__": [],
        "root": null
        }
    }"#;
    // A null child is a shape error, not an ordering one.
    match load_descriptor(document) {
        Err(DescriptorError::MalformedDescriptor { reason }) => {
            assert!(reason.contains("root"), "unexpected reason: {reason}");
        }
        other => panic!("expected MalformedDescriptor, got {other:?}"),
    }

    let document = r#"{
        "productname": "acme.probe",
        "__descr__": {"*": "probe"},
        "pdefs": {"__seq__": []}
    }"#;
    let descriptor = load_descriptor(document).expect("minimal descriptor load failed");
    assert!(descriptor.supports.is_empty());
    assert!(descriptor.parameters.is_empty());
    assert!(descriptor.default_values().is_empty());
}

#[test]
fn period_strings_parse_to_durations() {
    assert_eq!(parse_period("30s").unwrap(), Duration::from_secs(30));
    assert_eq!(parse_period("1m").unwrap(), Duration::from_secs(60));
    assert_eq!(parse_period("2h").unwrap(), Duration::from_secs(7_200));
    assert_eq!(parse_period("1d").unwrap(), Duration::from_secs(86_400));
    assert_eq!(parse_period("90").unwrap(), Duration::from_secs(90));
    assert_eq!(parse_period(" 5m ").unwrap(), Duration::from_secs(300));

    for invalid in ["", "h", "12x", "-5s", "1.5h", "one minute"] {
        match parse_period(invalid) {
            Err(DescriptorError::InvalidPeriod { value, .. }) => assert_eq!(value, invalid),
            other => panic!("expected InvalidPeriod for '{invalid}', got {other:?}"),
        }
    }
}

#[test]
fn period_formatting_picks_largest_exact_unit() {
    assert_eq!(format_period(Duration::from_secs(7_200)), "2h");
    assert_eq!(format_period(Duration::from_secs(60)), "1m");
    assert_eq!(format_period(Duration::from_secs(86_400)), "1d");
    assert_eq!(format_period(Duration::from_secs(90)), "90s");
    assert_eq!(format_period(Duration::from_secs(0)), "0s");
}

#[test]
fn catalog_resolves_device_type_codes() {
    let smp3v = model_for_code(601).expect("code 601 missing from catalog");
    assert_eq!(smp3v.name, "SMP3V");
    assert_eq!(smp3v.family, DeviceFamily::Pyranometer);
    assert_eq!(smp3v.signal, OutputSignal::Voltage);

    let suv5a = model_for_code(616).expect("code 616 missing from catalog");
    assert_eq!(suv5a.name, "SUV5A");
    assert_eq!(suv5a.family, DeviceFamily::UvRadiometer);
    assert_eq!(suv5a.signal, OutputSignal::Current);

    assert!(model_for_code(600).is_none());
    assert_eq!(models().len(), 16);

    let smp11 = model_for_name("smp11v").expect("name lookup failed");
    assert_eq!(smp11.code, 603);
}
