use std::fs;
use std::path::Path;

use cfgtree_core::nested::Decoder;
use cfgtree_core::{FieldPath, FieldSpec, Naming, PatchRule, PatchTable, ReconcileError};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::catalog::Catalog;

/// One `[[patch]]` entry of a patch file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PatchEntry {
    pub resource: String,
    /// Schema path of local names, e.g. `ip_range.lease_time`.
    pub field: String,
    pub rule: RuleName,
    #[serde(default)]
    pub value: Option<toml::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleName {
    Coerce,
    Empty,
    Constant,
}

#[derive(Debug, Deserialize)]
struct PatchFile {
    #[serde(default)]
    patch: Vec<PatchEntry>,
}

#[derive(Debug, Error)]
pub enum PatchLoadError {
    #[error("failed to read patch file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse patch file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("patch for unknown resource '{resource}'")]
    UnknownResource { resource: String },
    #[error("patch for unknown field '{field}' of '{resource}'")]
    UnknownField { resource: String, field: String },
    #[error("constant patch for '{resource}.{field}' has no value")]
    MissingValue { resource: String, field: String },
    #[error("constant patch for '{resource}.{field}' does not fit the field: {source}")]
    InvalidValue {
        resource: String,
        field: String,
        source: ReconcileError,
    },
}

/// Load patch entries from a TOML file.
pub fn load_patch_entries(path: &Path) -> Result<Vec<PatchEntry>, PatchLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| PatchLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_patch_entries(&raw, path.display().to_string())
}

/// Patches shipped with the binary.
pub fn default_patch_entries() -> Result<Vec<PatchEntry>, PatchLoadError> {
    let embedded = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/patches/default.toml"));
    parse_patch_entries(embedded, "embedded patches".to_string())
}

fn parse_patch_entries(raw: &str, path: String) -> Result<Vec<PatchEntry>, PatchLoadError> {
    let parsed: PatchFile =
        toml::from_str(raw).map_err(|source| PatchLoadError::Parse { path, source })?;
    Ok(parsed.patch)
}

/// Build a [`PatchTable`], checking every entry against the catalog.
pub fn build_patch_table(catalog: &Catalog, entries: &[PatchEntry]) -> Result<PatchTable, PatchLoadError> {
    let mut table = PatchTable::new();
    for entry in entries {
        let rule = compile_entry(catalog, entry)?;
        table.register(entry.resource.as_str(), entry.field.as_str(), rule);
    }
    Ok(table)
}

/// Build a [`PatchTable`] from the shipped patches. Schema files may replace
/// the resources these were written for, so entries that no longer fit the
/// catalog are dropped.
pub fn build_default_patch_table(catalog: &Catalog, entries: &[PatchEntry]) -> PatchTable {
    let mut table = PatchTable::new();
    for entry in entries {
        match compile_entry(catalog, entry) {
            Ok(rule) => {
                table.register(entry.resource.as_str(), entry.field.as_str(), rule);
            }
            Err(err) => warn!(%err, "skipping built-in patch"),
        }
    }
    table
}

fn compile_entry(catalog: &Catalog, entry: &PatchEntry) -> Result<PatchRule, PatchLoadError> {
    let schema = catalog
        .get(&entry.resource)
        .map(|e| &e.schema)
        .ok_or_else(|| PatchLoadError::UnknownResource {
            resource: entry.resource.clone(),
        })?;
    let spec = find_field(&schema.fields, &entry.field).ok_or_else(|| PatchLoadError::UnknownField {
        resource: entry.resource.clone(),
        field: entry.field.clone(),
    })?;

    match entry.rule {
        RuleName::Coerce => Ok(PatchRule::Coerce),
        RuleName::Empty => Ok(PatchRule::Empty),
        RuleName::Constant => constant_rule(entry, spec),
    }
}

fn constant_rule(entry: &PatchEntry, spec: &FieldSpec) -> Result<PatchRule, PatchLoadError> {
    let missing = || PatchLoadError::MissingValue {
        resource: entry.resource.clone(),
        field: entry.field.clone(),
    };
    let raw = entry.value.as_ref().ok_or_else(missing)?;
    let json = serde_json::to_value(raw).map_err(|_| missing())?;

    let mut decoder = Decoder::new(&entry.resource, Naming::Local);
    let path = FieldPath::root(&spec.local_name);
    let value = decoder
        .decode_field(spec, Some(&json), &path)
        .map_err(|source| PatchLoadError::InvalidValue {
            resource: entry.resource.clone(),
            field: entry.field.clone(),
            source,
        })?;
    Ok(value.map_or(PatchRule::Empty, PatchRule::Constant))
}

fn find_field<'a>(fields: &'a [FieldSpec], path: &str) -> Option<&'a FieldSpec> {
    let mut names = path.split('.');
    let first = names.next()?;
    let mut spec = fields.iter().find(|f| f.local_name == first)?;
    for name in names {
        spec = spec.children().iter().find(|f| f.local_name == name)?;
    }
    Some(spec)
}
