use std::fs;

use cfgtree_core::{FieldKind, ResourceSchema, SchemaError};

#[test]
fn loads_schema_from_toml_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("firewall_sniffer.toml");
    fs::write(
        &path,
        r#"
resource_type = "firewall_sniffer"
key = "id"

[[params]]
name = "adom"

[[field]]
name = "id"
type = "integer"

[[field]]
name = "interface"
kind = "set"

[[field]]
name = "anomaly"
kind = "repeated"

[[field.children]]
name = "name"

[[field.children]]
name = "threshold"
type = "integer"
"#,
    )
    .expect("write schema");

    let schema = ResourceSchema::load(&path).expect("schema should load");
    assert_eq!(schema.resource_type, "firewall_sniffer");
    assert!(matches!(schema.fields[1].kind, FieldKind::Set(_)));
    assert_eq!(schema.fields[2].children().len(), 2);
}

#[test]
fn reports_missing_and_invalid_files() {
    let dir = tempfile::tempdir().expect("tempdir");

    let missing = ResourceSchema::load(&dir.path().join("nope.toml")).expect_err("missing");
    assert!(matches!(missing, SchemaError::Load { .. }));

    let path = dir.path().join("dupes.toml");
    fs::write(
        &path,
        r#"
resource_type = "demo"

[[field]]
name = "status"

[[field]]
name = "status"
"#,
    )
    .expect("write schema");
    let dupes = ResourceSchema::load(&path).expect_err("duplicate");
    assert!(matches!(dupes, SchemaError::DuplicateWireName { .. }));
}
