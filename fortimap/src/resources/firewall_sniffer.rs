use cfgtree_core::{FieldSpec, ParamSpec, ResourceSchema};

use super::ResourceEntry;

pub const RESOURCE_TYPE: &str = "firewall_sniffer";

/// One-arm sniffer policy inside a policy package (`pkg/{pkg}/firewall/sniffer`).
pub fn schema() -> ResourceSchema {
    ResourceSchema::new(
        RESOURCE_TYPE,
        vec![
            FieldSpec::integer("id"),
            FieldSpec::string("uuid"),
            FieldSpec::string("status"),
            FieldSpec::string("logtraffic"),
            FieldSpec::string("ipv6"),
            FieldSpec::string("non-ip"),
            FieldSpec::string_set("interface"),
            FieldSpec::string("host"),
            FieldSpec::string("port"),
            FieldSpec::string("protocol"),
            FieldSpec::string("vlan"),
            FieldSpec::integer("max-packet-count"),
            FieldSpec::string("ip-threatfeed-status"),
            FieldSpec::string_set("ip-threatfeed"),
            FieldSpec::string("application-list-status"),
            FieldSpec::string_set("application-list"),
            FieldSpec::string("ips-sensor-status"),
            FieldSpec::string_set("ips-sensor"),
            FieldSpec::string("dsri"),
            FieldSpec::string("av-profile-status"),
            FieldSpec::string_set("av-profile"),
            FieldSpec::string("webfilter-profile-status"),
            FieldSpec::string_set("webfilter-profile"),
            FieldSpec::string("emailfilter-profile-status"),
            FieldSpec::string_set("emailfilter-profile"),
            FieldSpec::string("dlp-profile-status"),
            FieldSpec::string_set("dlp-profile"),
            FieldSpec::string("file-filter-profile-status"),
            FieldSpec::string_set("file-filter-profile"),
            FieldSpec::string("ips-dos-status"),
            FieldSpec::repeated(
                "anomaly",
                vec![
                    FieldSpec::string("name").required(),
                    FieldSpec::string("status"),
                    FieldSpec::string("log"),
                    FieldSpec::string("action"),
                    FieldSpec::string("quarantine"),
                    FieldSpec::integer("quarantine-expiry"),
                    FieldSpec::string("quarantine-log"),
                    FieldSpec::integer("threshold"),
                    FieldSpec::integer("threshold(default)").local("thresholddefault"),
                    FieldSpec::string("synproxy-tcp-mss"),
                    FieldSpec::string("synproxy-tcp-window"),
                ],
            )
            .sort_key("name"),
        ],
    )
    .with_key("id")
    .with_param(ParamSpec::provided("adom"))
    .with_param(ParamSpec::provided("pkg"))
}

inventory::submit! {
    ResourceEntry {
        resource_type: RESOURCE_TYPE,
        description: "firewall sniffer policy in a policy package",
        build: schema,
    }
}
