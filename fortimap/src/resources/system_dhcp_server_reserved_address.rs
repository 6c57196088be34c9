use cfgtree_core::{FieldSpec, ParamSpec, ResourceSchema};

use super::ResourceEntry;

pub const RESOURCE_TYPE: &str = "system_dhcp_server_reserved_address";

/// Reserved address managed as its own object under a DHCP server. The parent
/// server id is kept in state only and sent as a request parameter.
pub fn schema() -> ResourceSchema {
    ResourceSchema::new(
        RESOURCE_TYPE,
        vec![
            FieldSpec::string("server").state_only(),
            FieldSpec::integer("id"),
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
    .with_key("id")
    .with_param(ParamSpec::provided("device_name"))
    .with_param(ParamSpec::provided("device_vdom"))
    .with_param(ParamSpec::from_field("server", "server"))
}

inventory::submit! {
    ResourceEntry {
        resource_type: RESOURCE_TYPE,
        description: "reserved address of a device DHCP server",
        build: schema,
    }
}
