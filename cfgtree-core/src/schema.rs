//! Declarative field tables describing one resource.
//!
//! A [`ResourceSchema`] is the only per-resource input the codecs need. Tables
//! are built in code with the [`FieldSpec`] constructors or loaded from TOML:
//!
//! ```toml
//! resource_type = "system_dhcp_server"
//! key = "id"
//!
//! [[params]]
//! name = "adom"
//!
//! [[field]]
//! name = "id"
//! type = "integer"
//!
//! [[field]]
//! name = "ip-range"
//! kind = "repeated"
//!
//! [[field.children]]
//! name = "start-ip"
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Type of a scalar leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    #[default]
    String,
    Integer,
    Bool,
}

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Integer => "integer",
            ScalarKind::Bool => "boolean",
        }
    }
}

/// Cardinality of a field, carrying child specs for nested kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Scalar(ScalarKind),
    /// Unordered collection; order on the wire is not significant.
    Set(ScalarKind),
    /// Ordered collection; wire order is preserved.
    List(ScalarKind),
    /// Zero or one nested object.
    Single(Vec<FieldSpec>),
    /// Zero or more nested objects, kept in wire order.
    Repeated(Vec<FieldSpec>),
}

impl FieldKind {
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Scalar(_) => "scalar",
            FieldKind::Set(_) => "set",
            FieldKind::List(_) => "list",
            FieldKind::Single(_) => "single",
            FieldKind::Repeated(_) => "repeated",
        }
    }

    pub fn children(&self) -> &[FieldSpec] {
        match self {
            FieldKind::Single(children) | FieldKind::Repeated(children) => children,
            _ => &[],
        }
    }
}

/// Description of one field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawField")]
pub struct FieldSpec {
    /// Kebab-case name used by the device API.
    pub wire_name: String,
    /// Snake-case name used in typed state.
    pub local_name: String,
    pub kind: FieldKind,
    /// Keys, passwords and tokens. Never logged.
    pub sensitive: bool,
    /// Must be present when an enclosing nested block is encoded.
    pub required: bool,
    /// Child used to order repeated blocks when subtable sorting is enabled.
    pub sort_key: Option<String>,
    /// Lives only in typed state (parent identifiers); never read from or
    /// written to the wire.
    pub state_only: bool,
}

impl FieldSpec {
    pub fn new(wire_name: impl Into<String>, kind: FieldKind) -> Self {
        let wire_name = wire_name.into();
        Self {
            local_name: local_name_for(&wire_name),
            wire_name,
            kind,
            sensitive: false,
            required: false,
            sort_key: None,
            state_only: false,
        }
    }

    pub fn string(wire_name: impl Into<String>) -> Self {
        Self::new(wire_name, FieldKind::Scalar(ScalarKind::String))
    }

    pub fn integer(wire_name: impl Into<String>) -> Self {
        Self::new(wire_name, FieldKind::Scalar(ScalarKind::Integer))
    }

    pub fn boolean(wire_name: impl Into<String>) -> Self {
        Self::new(wire_name, FieldKind::Scalar(ScalarKind::Bool))
    }

    pub fn string_set(wire_name: impl Into<String>) -> Self {
        Self::new(wire_name, FieldKind::Set(ScalarKind::String))
    }

    pub fn list(wire_name: impl Into<String>, kind: ScalarKind) -> Self {
        Self::new(wire_name, FieldKind::List(kind))
    }

    pub fn single(wire_name: impl Into<String>, children: Vec<FieldSpec>) -> Self {
        Self::new(wire_name, FieldKind::Single(children))
    }

    pub fn repeated(wire_name: impl Into<String>, children: Vec<FieldSpec>) -> Self {
        Self::new(wire_name, FieldKind::Repeated(children))
    }

    /// Override the derived local name.
    pub fn local(mut self, name: impl Into<String>) -> Self {
        self.local_name = name.into();
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn sort_key(mut self, child: impl Into<String>) -> Self {
        self.sort_key = Some(child.into());
        self
    }

    pub fn state_only(mut self) -> Self {
        self.state_only = true;
        self
    }

    /// Whether the field is exchanged with objects keyed by `naming`.
    pub fn is_mapped(&self, naming: Naming) -> bool {
        naming == Naming::Local || !self.state_only
    }

    pub fn children(&self) -> &[FieldSpec] {
        self.kind.children()
    }

    /// Key under which this field appears in an object using `naming`.
    pub fn name_for(&self, naming: Naming) -> &str {
        match naming {
            Naming::Wire => &self.wire_name,
            Naming::Local => &self.local_name,
        }
    }
}

/// Which name a JSON object is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Naming {
    /// Device API objects (kebab-case).
    Wire,
    /// Typed state exported as JSON (snake_case).
    Local,
}

/// Derive a snake_case local name from a kebab-case wire name.
pub fn local_name_for(wire_name: &str) -> String {
    wire_name.replace(['-', ' '], "_")
}

/// A request parameter that correlates the object with its parent scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    /// Top-level local field supplying the value. Caller-supplied when unset.
    #[serde(default)]
    pub field: Option<String>,
}

impl ParamSpec {
    pub fn provided(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: None,
        }
    }

    pub fn from_field(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: Some(field.into()),
        }
    }
}

/// Field table for one resource type.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub fields: Vec<FieldSpec>,
    /// Local name of the field that identifies the object on the device.
    pub key: Option<String>,
    pub params: Vec<ParamSpec>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            resource_type: resource_type.into(),
            fields,
            key: None,
            params: Vec::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Top-level field by local name.
    pub fn field(&self, local_name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.local_name == local_name)
    }

    /// Key field spec, if the resource declares one.
    pub fn key_field(&self) -> Option<&FieldSpec> {
        self.key.as_deref().and_then(|k| self.field(k))
    }

    /// Check name uniqueness in every block, sort keys and the key field.
    pub fn validate(&self) -> Result<(), SchemaError> {
        validate_block(&self.resource_type, &self.fields)?;
        if let Some(key) = &self.key {
            if self.field(key).is_none() {
                return Err(SchemaError::UnknownKeyField {
                    resource: self.resource_type.clone(),
                    key: key.clone(),
                });
            }
        }
        for param in &self.params {
            if let Some(field) = &param.field {
                if self.field(field).is_none() {
                    return Err(SchemaError::UnknownParamField {
                        resource: self.resource_type.clone(),
                        param: param.name.clone(),
                        field: field.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Parse and validate a schema from TOML text.
    pub fn from_toml_str(raw: &str, origin: &str) -> Result<Self, SchemaError> {
        let parsed: RawSchema = toml::from_str(raw).map_err(|source| SchemaError::Parse {
            path: origin.to_string(),
            source,
        })?;
        let schema = ResourceSchema {
            resource_type: parsed.resource_type,
            fields: parsed.field,
            key: parsed.key,
            params: parsed.params,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Load a schema from a TOML file.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let raw = fs::read_to_string(path).map_err(|source| SchemaError::Load {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw, &path.display().to_string())
    }
}

fn validate_block(resource: &str, fields: &[FieldSpec]) -> Result<(), SchemaError> {
    let mut wire = HashSet::new();
    let mut local = HashSet::new();
    for field in fields {
        if !wire.insert(field.wire_name.as_str()) {
            return Err(SchemaError::DuplicateWireName {
                resource: resource.to_string(),
                name: field.wire_name.clone(),
            });
        }
        if !local.insert(field.local_name.as_str()) {
            return Err(SchemaError::DuplicateLocalName {
                resource: resource.to_string(),
                name: field.local_name.clone(),
            });
        }
        if let Some(key) = &field.sort_key {
            let known = matches!(field.kind, FieldKind::Repeated(_))
                && field.children().iter().any(|c| &c.local_name == key);
            if !known {
                return Err(SchemaError::UnknownSortKey {
                    resource: resource.to_string(),
                    field: field.local_name.clone(),
                    key: key.clone(),
                });
            }
        }
        validate_block(resource, field.children())?;
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct RawSchema {
    resource_type: String,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    params: Vec<ParamSpec>,
    #[serde(default)]
    field: Vec<FieldSpec>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawKind {
    #[default]
    Scalar,
    Set,
    List,
    Single,
    Repeated,
}

#[derive(Debug, Deserialize)]
struct RawField {
    name: String,
    #[serde(default)]
    local: Option<String>,
    #[serde(default)]
    kind: RawKind,
    #[serde(default, rename = "type")]
    scalar: ScalarKind,
    #[serde(default)]
    sensitive: bool,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    sort_key: Option<String>,
    #[serde(default)]
    state_only: bool,
    #[serde(default)]
    children: Vec<FieldSpec>,
}

impl TryFrom<RawField> for FieldSpec {
    type Error = String;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        let nested = matches!(raw.kind, RawKind::Single | RawKind::Repeated);
        if !nested && !raw.children.is_empty() {
            return Err(format!("field '{}' is not nested but declares children", raw.name));
        }
        let kind = match raw.kind {
            RawKind::Scalar => FieldKind::Scalar(raw.scalar),
            RawKind::Set => FieldKind::Set(raw.scalar),
            RawKind::List => FieldKind::List(raw.scalar),
            RawKind::Single => FieldKind::Single(raw.children),
            RawKind::Repeated => FieldKind::Repeated(raw.children),
        };
        let mut spec = FieldSpec::new(raw.name, kind);
        if let Some(local) = raw.local {
            spec.local_name = local;
        }
        spec.sensitive = raw.sensitive;
        spec.required = raw.required;
        spec.sort_key = raw.sort_key;
        spec.state_only = raw.state_only;
        Ok(spec)
    }
}
