use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use cfgtree_core::{ResourceSchema, SchemaError};
use thiserror::Error;
use tracing::{debug, info};

use crate::resources::builtin_entries;

/// Where a catalog entry came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOrigin {
    Builtin,
    File(String),
}

impl std::fmt::Display for SchemaOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaOrigin::Builtin => write!(f, "builtin"),
            SchemaOrigin::File(path) => write!(f, "{path}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub schema: ResourceSchema,
    pub origin: SchemaOrigin,
    pub description: String,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("failed to list schema directory {path}: {source}")]
    Dir {
        path: String,
        source: std::io::Error,
    },
    #[error("unknown resource type '{0}'")]
    UnknownResource(String),
}

/// Resource schemas by type: the built-ins plus any `*.toml` schema files.
///
/// A file declaring the same `resource_type` as a built-in replaces it.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
    pub fn builtin() -> Result<Self, CatalogError> {
        let mut catalog = Catalog::default();
        for entry in builtin_entries() {
            let schema = (entry.build)();
            schema.validate()?;
            catalog.entries.insert(
                entry.resource_type.to_string(),
                CatalogEntry {
                    schema,
                    origin: SchemaOrigin::Builtin,
                    description: entry.description.to_string(),
                },
            );
        }
        Ok(catalog)
    }

    /// Built-ins overlaid with every schema file found in `dir`.
    pub fn with_schema_dir(dir: &Path) -> Result<Self, CatalogError> {
        let mut catalog = Self::builtin()?;
        catalog.load_dir(dir)?;
        Ok(catalog)
    }

    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, CatalogError> {
        let listing = fs::read_dir(dir).map_err(|source| CatalogError::Dir {
            path: dir.display().to_string(),
            source,
        })?;

        let mut files: Vec<_> = listing
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        files.sort();

        for path in &files {
            let schema = ResourceSchema::load(path)?;
            debug!(resource = schema.resource_type.as_str(), path = %path.display(), "loaded schema file");
            self.insert(schema, SchemaOrigin::File(path.display().to_string()));
        }
        info!(dir = %dir.display(), count = files.len(), "schema directory loaded");
        Ok(files.len())
    }

    pub fn insert(&mut self, schema: ResourceSchema, origin: SchemaOrigin) {
        let description = match &origin {
            SchemaOrigin::Builtin => String::new(),
            SchemaOrigin::File(path) => format!("loaded from {path}"),
        };
        self.entries.insert(
            schema.resource_type.clone(),
            CatalogEntry {
                schema,
                origin,
                description,
            },
        );
    }

    pub fn get(&self, resource_type: &str) -> Option<&CatalogEntry> {
        self.entries.get(resource_type)
    }

    pub fn schema(&self, resource_type: &str) -> Result<&ResourceSchema, CatalogError> {
        self.get(resource_type)
            .map(|e| &e.schema)
            .ok_or_else(|| CatalogError::UnknownResource(resource_type.to_string()))
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
