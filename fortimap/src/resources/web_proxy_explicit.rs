use cfgtree_core::{FieldSpec, ParamSpec, ResourceSchema};

use super::ResourceEntry;

pub const RESOURCE_TYPE: &str = "web_proxy_explicit";

/// Explicit web proxy settings of a device. A singleton without key field.
pub fn schema() -> ResourceSchema {
    ResourceSchema::new(
        RESOURCE_TYPE,
        vec![
            FieldSpec::string("status"),
            FieldSpec::string("secure-web-proxy"),
            FieldSpec::string("ftp-over-http"),
            FieldSpec::string("socks"),
            FieldSpec::string("http-incoming-port"),
            FieldSpec::string("http-connection-mode"),
            FieldSpec::string("https-incoming-port"),
            FieldSpec::string_set("secure-web-proxy-cert"),
            FieldSpec::string("client-cert"),
            FieldSpec::string("user-agent-detect"),
            FieldSpec::string("empty-cert-action"),
            FieldSpec::string("ssl-dh-bits"),
            FieldSpec::string("ftp-incoming-port"),
            FieldSpec::string("socks-incoming-port"),
            FieldSpec::string("incoming-ip"),
            FieldSpec::string_set("outgoing-ip"),
            FieldSpec::string("interface-select-method"),
            FieldSpec::string("interface"),
            FieldSpec::string("ipv6-status"),
            FieldSpec::string("incoming-ip6"),
            FieldSpec::string_set("outgoing-ip6"),
            FieldSpec::string("strict-guest"),
            FieldSpec::string("pref-dns-result"),
            FieldSpec::string("unknown-http-version"),
            FieldSpec::string("realm"),
            FieldSpec::string("sec-default-action"),
            FieldSpec::string("https-replacement-message"),
            FieldSpec::string("message-upon-server-error"),
            FieldSpec::string("pac-file-server-status"),
            FieldSpec::string("pac-file-url"),
            FieldSpec::string_set("pac-file-server-port"),
            FieldSpec::string("pac-file-through-https"),
            FieldSpec::string("pac-file-name"),
            FieldSpec::string("pac-file-data"),
            FieldSpec::repeated(
                "pac-policy",
                vec![
                    FieldSpec::integer("policyid").required(),
                    FieldSpec::string("status"),
                    FieldSpec::string_set("srcaddr"),
                    FieldSpec::string_set("srcaddr6"),
                    FieldSpec::string_set("dstaddr"),
                    FieldSpec::string("pac-file-name"),
                    FieldSpec::string("pac-file-data"),
                    FieldSpec::string("comments"),
                ],
            )
            .sort_key("policyid"),
            FieldSpec::string("ssl-algorithm"),
            FieldSpec::string("trace-auth-no-rsp"),
        ],
    )
    .with_param(ParamSpec::provided("device_name"))
    .with_param(ParamSpec::provided("device_vdom"))
}

inventory::submit! {
    ResourceEntry {
        resource_type: RESOURCE_TYPE,
        description: "explicit web proxy settings of a managed device",
        build: schema,
    }
}
