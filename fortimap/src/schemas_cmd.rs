use anyhow::Result;
use fortimap::report::{render_catalog, render_schema_tree};
use serde_json::json;

use crate::cli::{OutputFormat, SchemasArgs};
use crate::session::Session;

pub fn run_schemas(session: &Session, args: SchemasArgs) -> Result<()> {
    if let Some(resource) = &args.resource {
        let schema = session.schema(resource)?;
        match args.format {
            OutputFormat::Text => println!("{}", render_schema_tree(schema, args.depth)),
            OutputFormat::Json => {
                let fields: Vec<_> = schema
                    .fields
                    .iter()
                    .map(|f| {
                        json!({
                            "wire": f.wire_name,
                            "local": f.local_name,
                            "kind": f.kind.label(),
                            "children": f.children().len(),
                        })
                    })
                    .collect();
                let doc = json!({
                    "resource_type": schema.resource_type,
                    "key": schema.key,
                    "params": schema.params.iter().map(|p| &p.name).collect::<Vec<_>>(),
                    "fields": fields,
                });
                println!("{}", serde_json::to_string_pretty(&doc)?);
            }
        }
        return Ok(());
    }

    let entries: Vec<_> = session.catalog.entries().collect();
    match args.format {
        OutputFormat::Text => println!("{}", render_catalog(&entries)),
        OutputFormat::Json => {
            let doc: Vec<_> = entries
                .iter()
                .map(|e| {
                    json!({
                        "resource_type": e.schema.resource_type,
                        "key": e.schema.key,
                        "fields": e.schema.fields.len(),
                        "origin": e.origin.to_string(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }
    Ok(())
}
