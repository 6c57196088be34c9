use cfgtree_core::{format_summary, format_text, DecodeReport, FieldKind, FieldSpec, ResourceSchema};
use colored::Colorize;

use crate::catalog::CatalogEntry;

/// Render decode outcomes for terminal output.
pub fn render_report(report: &DecodeReport) -> String {
    let raw = format_text(report);
    let mut out = Vec::new();

    for line in raw.lines() {
        let colored = if line.starts_with('=') {
            line.green().to_string()
        } else if line.starts_with('-') {
            line.red().to_string()
        } else if line.starts_with('~') {
            line.yellow().to_string()
        } else if line.starts_with('!') {
            line.magenta().to_string()
        } else {
            line.dimmed().to_string()
        };
        out.push(colored);
    }

    out.join("\n")
}

/// Render outcome counts for terminal output.
pub fn render_summary(report: &DecodeReport) -> String {
    format_summary(report).cyan().to_string()
}

/// One line per catalog entry.
pub fn render_catalog(entries: &[&CatalogEntry]) -> String {
    let mut out = Vec::new();
    for entry in entries {
        let schema = &entry.schema;
        out.push(format!(
            "{} key={} params={} fields={} origin={}{}",
            schema.resource_type.bold(),
            schema.key.as_deref().unwrap_or("-"),
            param_names(schema),
            schema.fields.len(),
            entry.origin,
            if entry.description.is_empty() {
                String::new()
            } else {
                format!("  # {}", entry.description)
            }
        ));
    }
    out.join("\n")
}

/// Render a schema as an indented field tree, `depth` levels deep.
pub fn render_schema_tree(schema: &ResourceSchema, depth: usize) -> String {
    let mut out = vec![format!(
        "{} (key={}, params={})",
        schema.resource_type.bold(),
        schema.key.as_deref().unwrap_or("-"),
        param_names(schema)
    )];
    render_fields(&schema.fields, 1, depth, &mut out);
    out.join("\n")
}

fn render_fields(fields: &[FieldSpec], level: usize, depth: usize, out: &mut Vec<String>) {
    if level > depth {
        return;
    }
    for field in fields {
        let mut flags = Vec::new();
        if field.required {
            flags.push("required".to_string());
        }
        if field.sensitive {
            flags.push("sensitive".to_string());
        }
        if field.state_only {
            flags.push("state-only".to_string());
        }
        if let Some(key) = &field.sort_key {
            flags.push(format!("sort={key}"));
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(","))
        };
        let name = if field.local_name == field.wire_name {
            field.local_name.clone()
        } else {
            format!("{} <- {}", field.local_name, field.wire_name)
        };
        out.push(format!(
            "{}{} : {}{}",
            "  ".repeat(level),
            name,
            kind_label(&field.kind).cyan(),
            flags
        ));
        render_fields(field.children(), level + 1, depth, out);
    }
}

fn kind_label(kind: &FieldKind) -> String {
    match kind {
        FieldKind::Scalar(k) => k.name().to_string(),
        FieldKind::Set(k) => format!("set<{}>", k.name()),
        FieldKind::List(k) => format!("list<{}>", k.name()),
        FieldKind::Single(_) => "block".to_string(),
        FieldKind::Repeated(_) => "blocks".to_string(),
    }
}

fn param_names(schema: &ResourceSchema) -> String {
    if schema.params.is_empty() {
        return "-".to_string();
    }
    schema
        .params
        .iter()
        .map(|p| match &p.field {
            Some(field) if field != &p.name => format!("{}<-{}", p.name, field),
            Some(_) => format!("{}*", p.name),
            None => p.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(",")
}
