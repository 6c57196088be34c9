//! Device API seam and the in-process stand-ins used by the CLI and tests.
//!
//! The real JSON-RPC transport lives outside this crate. [`ConfigApi`] is the
//! boundary: four calls, objects in wire form, errors with `NotFound` kept
//! apart from everything else so a read can tell "gone" from "broken".

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::fs;
use std::path::{Path, PathBuf};

use cfgtree_core::ConfigObject;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::Catalog;

/// Key of the identity field in create/update responses.
pub const MKEY: &str = "mkey";

/// Correlation parameters sent with a request (`adom`, `pkg`, `device_name`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams(BTreeMap<String, String>);

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries of `other` win over entries already present.
    pub fn merged(&self, other: &RequestParams) -> RequestParams {
        let mut merged = self.clone();
        merged.0.extend(other.0.clone());
        merged
    }
}

impl FromIterator<(String, String)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Display for RequestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "-");
        }
        let joined: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}={v}")).collect();
        write!(f, "{}", joined.join(","))
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{resource} '{key}' not found")]
    NotFound { resource: String, key: String },
    #[error("{resource} '{key}' already exists")]
    Conflict { resource: String, key: String },
    #[error("failed to access object store {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid object store {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

/// Create/Read/Update/Delete against the device configuration database.
pub trait ConfigApi {
    /// Create an object. The response carries the assigned identity under `mkey`.
    fn create(
        &mut self,
        resource_type: &str,
        object: &ConfigObject,
        params: &RequestParams,
    ) -> Result<ConfigObject, ApiError>;

    fn read(&self, resource_type: &str, key: &str, params: &RequestParams) -> Result<ConfigObject, ApiError>;

    /// Update fields present in `object`; absent fields keep their device value.
    fn update(
        &mut self,
        resource_type: &str,
        object: &ConfigObject,
        key: &str,
        params: &RequestParams,
    ) -> Result<ConfigObject, ApiError>;

    fn delete(&mut self, resource_type: &str, key: &str, params: &RequestParams) -> Result<(), ApiError>;
}

/// Objects by resource type, then request scope (rendered params), then key.
pub type ObjectStore = BTreeMap<String, BTreeMap<String, BTreeMap<String, ConfigObject>>>;

/// In-memory device. Resource types without a registered key field are
/// singletons stored under their own type name.
#[derive(Debug, Clone, Default)]
pub struct MemoryApi {
    objects: ObjectStore,
    key_fields: BTreeMap<String, String>,
}

impl MemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Device knowing the key field of every catalog resource.
    pub fn for_catalog(catalog: &Catalog) -> Self {
        let mut api = Self::new();
        for entry in catalog.entries() {
            if let Some(field) = entry.schema.key_field() {
                api.register_key_field(&entry.schema.resource_type, &field.wire_name);
            }
        }
        api
    }

    pub fn register_key_field(&mut self, resource_type: &str, wire_name: &str) {
        self.key_fields
            .insert(resource_type.to_string(), wire_name.to_string());
    }

    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    pub fn object(&self, resource_type: &str, key: &str, params: &RequestParams) -> Option<&ConfigObject> {
        self.objects
            .get(resource_type)?
            .get(&params.to_string())?
            .get(key)
    }

    fn scope_mut(&mut self, resource_type: &str, params: &RequestParams) -> &mut BTreeMap<String, ConfigObject> {
        self.objects
            .entry(resource_type.to_string())
            .or_default()
            .entry(params.to_string())
            .or_default()
    }

    fn next_id(scope: &BTreeMap<String, ConfigObject>) -> i64 {
        scope
            .keys()
            .filter_map(|k| k.parse::<i64>().ok())
            .max()
            .unwrap_or(0)
            + 1
    }
}

fn mkey_response(key: &str) -> ConfigObject {
    let mut response = ConfigObject::new();
    let value = key
        .parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(key.to_string()));
    response.insert(MKEY.to_string(), value);
    response
}

/// Render a wire key value the way it appears in request URLs.
pub fn key_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) if items.len() == 1 => key_string(&items[0]),
        _ => None,
    }
}

impl ConfigApi for MemoryApi {
    fn create(
        &mut self,
        resource_type: &str,
        object: &ConfigObject,
        params: &RequestParams,
    ) -> Result<ConfigObject, ApiError> {
        let key_field = self.key_fields.get(resource_type).cloned();
        let scope = self.scope_mut(resource_type, params);

        let Some(key_field) = key_field else {
            let stored = scope.entry(resource_type.to_string()).or_default();
            stored.extend(object.clone());
            debug!(resource = resource_type, %params, "singleton created");
            return Ok(mkey_response(resource_type));
        };

        let mut object = object.clone();
        let key = match object.get(&key_field).and_then(key_string) {
            Some(key) => key,
            None => {
                let id = Self::next_id(scope);
                object.insert(key_field, Value::from(id));
                id.to_string()
            }
        };
        if scope.contains_key(&key) {
            return Err(ApiError::Conflict {
                resource: resource_type.to_string(),
                key,
            });
        }
        scope.insert(key.clone(), object);
        debug!(resource = resource_type, %key, %params, "object created");
        Ok(mkey_response(&key))
    }

    fn read(&self, resource_type: &str, key: &str, params: &RequestParams) -> Result<ConfigObject, ApiError> {
        self.object(resource_type, key, params)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                resource: resource_type.to_string(),
                key: key.to_string(),
            })
    }

    fn update(
        &mut self,
        resource_type: &str,
        object: &ConfigObject,
        key: &str,
        params: &RequestParams,
    ) -> Result<ConfigObject, ApiError> {
        let singleton = !self.key_fields.contains_key(resource_type);
        let scope = self.scope_mut(resource_type, params);
        let stored = if singleton {
            scope.entry(key.to_string()).or_default()
        } else {
            scope.get_mut(key).ok_or_else(|| ApiError::NotFound {
                resource: resource_type.to_string(),
                key: key.to_string(),
            })?
        };
        stored.extend(object.clone());
        debug!(resource = resource_type, %key, %params, fields = object.len(), "object updated");
        Ok(mkey_response(key))
    }

    fn delete(&mut self, resource_type: &str, key: &str, params: &RequestParams) -> Result<(), ApiError> {
        let removed = self
            .objects
            .get_mut(resource_type)
            .and_then(|scopes| scopes.get_mut(&params.to_string()))
            .and_then(|scope| scope.remove(key));
        match removed {
            Some(_) => {
                debug!(resource = resource_type, %key, %params, "object deleted");
                Ok(())
            }
            None => Err(ApiError::NotFound {
                resource: resource_type.to_string(),
                key: key.to_string(),
            }),
        }
    }
}

/// [`MemoryApi`] persisted to a JSON file after every mutation.
#[derive(Debug)]
pub struct JsonFileApi {
    path: PathBuf,
    inner: MemoryApi,
}

impl JsonFileApi {
    /// Open `path`, starting empty when the file does not exist yet.
    pub fn open(path: &Path, catalog: &Catalog) -> Result<Self, ApiError> {
        let mut inner = MemoryApi::for_catalog(catalog);
        if path.exists() {
            let raw = fs::read_to_string(path).map_err(|source| ApiError::Io {
                path: path.display().to_string(),
                source,
            })?;
            inner.objects = serde_json::from_str(&raw).map_err(|source| ApiError::Json {
                path: path.display().to_string(),
                source,
            })?;
            info!(path = %path.display(), "object store loaded");
        }
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn objects(&self) -> &ObjectStore {
        self.inner.objects()
    }

    fn save(&self) -> Result<(), ApiError> {
        let json = serde_json::to_string_pretty(&self.inner.objects).map_err(|source| ApiError::Json {
            path: self.path.display().to_string(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| ApiError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }
}

impl ConfigApi for JsonFileApi {
    fn create(
        &mut self,
        resource_type: &str,
        object: &ConfigObject,
        params: &RequestParams,
    ) -> Result<ConfigObject, ApiError> {
        let response = self.inner.create(resource_type, object, params)?;
        self.save()?;
        Ok(response)
    }

    fn read(&self, resource_type: &str, key: &str, params: &RequestParams) -> Result<ConfigObject, ApiError> {
        self.inner.read(resource_type, key, params)
    }

    fn update(
        &mut self,
        resource_type: &str,
        object: &ConfigObject,
        key: &str,
        params: &RequestParams,
    ) -> Result<ConfigObject, ApiError> {
        let response = self.inner.update(resource_type, object, key, params)?;
        self.save()?;
        Ok(response)
    }

    fn delete(&mut self, resource_type: &str, key: &str, params: &RequestParams) -> Result<(), ApiError> {
        self.inner.delete(resource_type, key, params)?;
        self.save()
    }
}
