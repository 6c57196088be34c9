use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn schemas_lists_builtin_resources() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fortimap"));
    cmd.env("NO_COLOR", "1")
        .arg("schemas")
        .assert()
        .success()
        .stdout(predicate::str::contains("firewall_sniffer"))
        .stdout(predicate::str::contains("system_dhcp_server key=id params=device_name,device_vdom"))
        .stdout(predicate::str::contains("vpn_ipsec_phase2interface"))
        .stdout(predicate::str::contains("web_proxy_explicit key=-"));
}

#[test]
fn schemas_renders_one_resource_tree() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fortimap"));
    cmd.env("NO_COLOR", "1")
        .arg("schemas")
        .arg("--resource")
        .arg("system_dhcp_server")
        .arg("--depth")
        .arg("2")
        .assert()
        .success()
        .stdout(predicate::str::contains("ip_range <- ip-range : blocks [sort=id]"))
        .stdout(predicate::str::contains("start_ip <- start-ip : string"));
}

#[test]
fn schemas_json_lists_fields() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fortimap"));
    let output = cmd
        .arg("schemas")
        .arg("--resource")
        .arg("web_proxy_explicit")
        .arg("--format")
        .arg("json")
        .output()
        .expect("run");
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(doc["resource_type"], "web_proxy_explicit");
    assert!(doc["key"].is_null());
    let fields = doc["fields"].as_array().expect("fields");
    assert!(fields
        .iter()
        .any(|f| f["local"] == "pac_policy" && f["kind"] == "repeated"));
}

#[test]
fn schemas_rejects_unknown_resource() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fortimap"));
    cmd.arg("schemas")
        .arg("--resource")
        .arg("firewall_policy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown resource type 'firewall_policy'"));
}

#[test]
fn schema_override_does_not_break_builtin_patches() {
    let dir = tempdir().expect("tempdir");
    fs::create_dir(dir.path().join("schemas")).expect("schema dir");
    fs::write(
        dir.path().join("schemas").join("sniffer.toml"),
        "resource_type = \"firewall_sniffer\"\nkey = \"id\"\n\n[[field]]\nname = \"id\"\ntype = \"integer\"\n\n[[field]]\nname = \"status\"\n",
    )
    .expect("write schema");
    let config = dir.path().join("fortimap.toml");
    fs::write(&config, "schemas_dir = \"schemas\"\n").expect("write config");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fortimap"));
    cmd.env("NO_COLOR", "1")
        .arg("--config")
        .arg(&config)
        .arg("schemas")
        .arg("--resource")
        .arg("firewall_sniffer")
        .assert()
        .success()
        .stdout(predicate::str::contains("status : string"))
        .stdout(predicate::str::contains("max_packet_count").not());
}
