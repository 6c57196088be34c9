use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cfgtree_core::{ImportPolicy, PatchTable, ReconcileOptions, ResourceSchema, TypedBlock};
use fortimap::catalog::Catalog;
use fortimap::client::RequestParams;
use fortimap::patches::{
    build_default_patch_table, build_patch_table, default_patch_entries, load_patch_entries,
};
use fortimap::resource::state_from_json;
use fortimap::settings::Settings;
use serde_json::Value;
use tracing::debug;

/// Settings, catalog and patch table shared by every command.
pub struct Session {
    pub settings: Settings,
    pub catalog: Catalog,
    pub patches: PatchTable,
}

impl Session {
    pub fn open(config: Option<&Path>) -> Result<Self> {
        let settings = Settings::discover(config).context("failed to load settings")?;

        let catalog = match &settings.schemas_dir {
            Some(dir) => Catalog::with_schema_dir(dir)
                .with_context(|| format!("failed to load schemas from {}", dir.display()))?,
            None => Catalog::builtin().context("invalid built-in schema")?,
        };

        let defaults = default_patch_entries().context("invalid built-in patches")?;
        let mut patches = build_default_patch_table(&catalog, &defaults);
        if let Some(path) = &settings.patches_file {
            let entries = load_patch_entries(path)?;
            let user = build_patch_table(&catalog, &entries)
                .with_context(|| format!("invalid patch rules in {}", path.display()))?;
            patches.extend(user);
        }
        debug!(resources = catalog.len(), patches = patches.len(), "session ready");

        Ok(Self {
            settings,
            catalog,
            patches,
        })
    }

    pub fn schema(&self, resource: &str) -> Result<&ResourceSchema> {
        Ok(self.catalog.schema(resource)?)
    }

    /// `--import-table` on the command line turns import on; it cannot turn
    /// off a settings-file `import_table = true`.
    pub fn options(&self, import_table: bool) -> ReconcileOptions {
        ReconcileOptions::default()
            .with_import_policy(ImportPolicy::from_flag(import_table || self.settings.import_table))
    }

    /// Settings defaults overlaid with `--param` pairs.
    pub fn params(&self, cli: &[(String, String)]) -> RequestParams {
        let given: RequestParams = cli.iter().cloned().collect();
        self.settings.default_params().merged(&given)
    }
}

pub fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse JSON in {}", path.display()))
}

pub fn read_state(schema: &ResourceSchema, path: &Path) -> Result<TypedBlock> {
    let json = read_json(path)?;
    state_from_json(schema, &json).with_context(|| format!("invalid typed state in {}", path.display()))
}

pub fn write_json(path: &Path, value: &Value) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}
