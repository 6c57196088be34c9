use cfgtree_core::{FieldSpec, ParamSpec, ResourceSchema, ScalarKind};

use super::ResourceEntry;

pub const RESOURCE_TYPE: &str = "system_dhcp_server";

fn vendor_match() -> Vec<FieldSpec> {
    vec![
        FieldSpec::string("vci-match"),
        FieldSpec::string_set("vci-string"),
        FieldSpec::string("uci-match"),
        FieldSpec::string_set("uci-string"),
    ]
}

fn ip_range() -> FieldSpec {
    let mut children = vec![
        FieldSpec::integer("id").required(),
        FieldSpec::string("start-ip"),
        FieldSpec::string("end-ip"),
        FieldSpec::integer("lease-time"),
    ];
    children.extend(vendor_match());
    FieldSpec::repeated("ip-range", children).sort_key("id")
}

fn options() -> FieldSpec {
    let mut children = vec![
        FieldSpec::integer("id").required(),
        FieldSpec::integer("code"),
        FieldSpec::string("type"),
        FieldSpec::string("value"),
        FieldSpec::string_set("ip"),
    ];
    children.extend(vendor_match());
    FieldSpec::repeated("options", children).sort_key("id")
}

fn exclude_range() -> FieldSpec {
    let mut children = vec![
        FieldSpec::integer("id").required(),
        FieldSpec::string("start-ip"),
        FieldSpec::string("end-ip"),
        FieldSpec::integer("lease-time"),
    ];
    children.extend(vendor_match());
    FieldSpec::repeated("exclude-range", children).sort_key("id")
}

fn reserved_address() -> FieldSpec {
    FieldSpec::repeated(
        "reserved-address",
        vec![
            FieldSpec::integer("id").required(),
            FieldSpec::string("type"),
            FieldSpec::string("ip"),
            FieldSpec::string("mac"),
            FieldSpec::string("action"),
            FieldSpec::string("circuit-id-type"),
            FieldSpec::string("circuit-id"),
            FieldSpec::string("remote-id-type"),
            FieldSpec::string("remote-id"),
            FieldSpec::string("description"),
        ],
    )
    .sort_key("id")
}

/// DHCP server on a managed device (`device/{device}/vdom/{vdom}/system/dhcp/server`).
pub fn schema() -> ResourceSchema {
    let mut fields = vec![
        FieldSpec::integer("id"),
        FieldSpec::string("status"),
        FieldSpec::integer("lease-time"),
        FieldSpec::string("mac-acl-default-action"),
        FieldSpec::string("forticlient-on-net-status"),
        FieldSpec::string("dns-service"),
    ];
    for i in 1..=4 {
        fields.push(FieldSpec::string(format!("dns-server{i}")));
    }
    fields.push(FieldSpec::string("wifi-ac-service"));
    for i in 1..=3 {
        fields.push(FieldSpec::string(format!("wifi-ac{i}")));
    }
    fields.push(FieldSpec::string("ntp-service"));
    for i in 1..=3 {
        fields.push(FieldSpec::string(format!("ntp-server{i}")));
    }
    fields.extend([
        FieldSpec::string("domain"),
        FieldSpec::string("wins-server1"),
        FieldSpec::string("wins-server2"),
        FieldSpec::string("default-gateway"),
        FieldSpec::string("next-server"),
        FieldSpec::string("netmask"),
        FieldSpec::string_set("interface"),
        FieldSpec::string("ip-mode"),
        FieldSpec::integer("conflicted-ip-timeout"),
        FieldSpec::integer("ipsec-lease-hold"),
        FieldSpec::string("auto-configuration"),
        FieldSpec::string("dhcp-settings-from-fortiipam"),
        FieldSpec::string("auto-managed-status"),
        FieldSpec::string("ddns-update"),
        FieldSpec::string("ddns-update-override"),
        FieldSpec::string("ddns-server-ip"),
        FieldSpec::string("ddns-zone"),
        FieldSpec::string("ddns-auth"),
        FieldSpec::string("ddns-keyname"),
        FieldSpec::string_set("ddns-key").sensitive(),
        FieldSpec::integer("ddns-ttl"),
        FieldSpec::string("vci-match"),
        FieldSpec::string_set("vci-string"),
        FieldSpec::string("timezone-option"),
        FieldSpec::string("timezone"),
        FieldSpec::list("tftp-server", ScalarKind::String),
        FieldSpec::string("filename"),
        FieldSpec::string("server-type"),
        ip_range(),
        options(),
        exclude_range(),
        reserved_address(),
    ]);

    ResourceSchema::new(RESOURCE_TYPE, fields)
        .with_key("id")
        .with_param(ParamSpec::provided("device_name"))
        .with_param(ParamSpec::provided("device_vdom"))
}

inventory::submit! {
    ResourceEntry {
        resource_type: RESOURCE_TYPE,
        description: "DHCP server on a managed device",
        build: schema,
    }
}

#[cfg(test)]
mod tests {
    use super::schema;

    #[test]
    fn ddns_key_is_the_only_sensitive_field() {
        let schema = schema();
        let sensitive: Vec<&str> = schema
            .fields
            .iter()
            .filter(|f| f.sensitive)
            .map(|f| f.local_name.as_str())
            .collect();
        assert_eq!(sensitive, vec!["ddns_key"]);
        assert!(schema.field("dns_server4").is_some());
        assert!(schema.field("ntp_server3").is_some());
    }
}
