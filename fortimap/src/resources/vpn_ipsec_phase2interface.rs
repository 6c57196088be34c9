use cfgtree_core::{FieldSpec, ParamSpec, ResourceSchema};

use super::ResourceEntry;

pub const RESOURCE_TYPE: &str = "vpn_ipsec_phase2interface";

fn selector(side: &str) -> Vec<FieldSpec> {
    vec![
        FieldSpec::string(format!("{side}-name")),
        FieldSpec::string(format!("{side}-name6")),
        FieldSpec::string(format!("{side}-addr-type")),
        FieldSpec::string(format!("{side}-start-ip")),
        FieldSpec::string(format!("{side}-start-ip6")),
        FieldSpec::string(format!("{side}-end-ip")),
        FieldSpec::string(format!("{side}-end-ip6")),
        FieldSpec::string(format!("{side}-subnet")),
        FieldSpec::string(format!("{side}-subnet6")),
        FieldSpec::integer(format!("{side}-port")),
    ]
}

/// Route-based IPsec phase-2 selector bound to a phase-1 interface.
pub fn schema() -> ResourceSchema {
    let mut fields = vec![
        FieldSpec::string("name"),
        FieldSpec::string_set("phase1name"),
        FieldSpec::string("dhcp-ipsec"),
        FieldSpec::string_set("proposal"),
        FieldSpec::string("pfs"),
        FieldSpec::string("ipv4-df"),
        FieldSpec::string_set("dhgrp"),
        FieldSpec::string_set("addke1"),
        FieldSpec::string("replay"),
        FieldSpec::string("keepalive"),
        FieldSpec::string("auto-negotiate"),
        FieldSpec::string("add-route"),
        FieldSpec::string("inbound-dscp-copy"),
        FieldSpec::string("auto-discovery-sender"),
        FieldSpec::string("auto-discovery-forwarder"),
        FieldSpec::integer("keylifeseconds"),
        FieldSpec::integer("keylifekbs"),
        FieldSpec::string("keylife-type"),
        FieldSpec::string("single-source"),
        FieldSpec::string("route-overlap"),
        FieldSpec::string("encapsulation"),
        FieldSpec::string("l2tp"),
        FieldSpec::string("comments"),
        FieldSpec::string("initiator-ts-narrow"),
        FieldSpec::string("diffserv"),
        FieldSpec::string("diffservcode"),
        FieldSpec::integer("protocol"),
    ];
    fields.extend(selector("src"));
    fields.extend(selector("dst"));

    ResourceSchema::new(RESOURCE_TYPE, fields)
        .with_key("name")
        .with_param(ParamSpec::provided("adom"))
}

inventory::submit! {
    ResourceEntry {
        resource_type: RESOURCE_TYPE,
        description: "IPsec phase-2 interface template",
        build: schema,
    }
}
