//! Built-in resource field tables.
//!
//! Each submodule declares one FortiManager object as a [`ResourceSchema`] and
//! registers it with `inventory`, so adding a resource is one new file plus a
//! `mod` line here.

use cfgtree_core::ResourceSchema;

pub mod firewall_sniffer;
pub mod system_dhcp_server;
pub mod system_dhcp_server_reserved_address;
pub mod vpn_ipsec_phase2interface;
pub mod web_proxy_explicit;

/// Registration record for a built-in resource.
pub struct ResourceEntry {
    pub resource_type: &'static str,
    pub description: &'static str,
    pub build: fn() -> ResourceSchema,
}

inventory::collect!(ResourceEntry);

/// All registered built-ins, ordered by resource type.
pub fn builtin_entries() -> Vec<&'static ResourceEntry> {
    let mut entries: Vec<&'static ResourceEntry> = inventory::iter::<ResourceEntry>.into_iter().collect();
    entries.sort_by_key(|e| e.resource_type);
    entries
}

/// Build the schema of a built-in resource.
pub fn builtin_schema(resource_type: &str) -> Option<ResourceSchema> {
    inventory::iter::<ResourceEntry>
        .into_iter()
        .find(|e| e.resource_type == resource_type)
        .map(|e| (e.build)())
}

#[cfg(test)]
mod tests {
    use super::{builtin_entries, builtin_schema};

    #[test]
    fn every_builtin_is_registered_and_valid() {
        let entries = builtin_entries();
        let names: Vec<&str> = entries.iter().map(|e| e.resource_type).collect();
        assert_eq!(
            names,
            vec![
                "firewall_sniffer",
                "system_dhcp_server",
                "system_dhcp_server_reserved_address",
                "vpn_ipsec_phase2interface",
                "web_proxy_explicit",
            ]
        );

        for entry in entries {
            let schema = (entry.build)();
            assert_eq!(schema.resource_type, entry.resource_type);
            schema
                .validate()
                .unwrap_or_else(|err| panic!("{} is invalid: {err}", entry.resource_type));
        }
    }

    #[test]
    fn unknown_builtin_is_none() {
        assert!(builtin_schema("firewall_policy").is_none());
        assert!(builtin_schema("firewall_sniffer").is_some());
    }
}
