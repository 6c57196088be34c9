use thiserror::Error;

use crate::path::FieldPath;

/// Errors raised while converting a single field between wire and typed form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Wire value shape does not match the declared field kind.
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// A repeated-nested element was not a mapping.
    #[error("element {index} is {found}, expected an object")]
    MalformedElement { index: usize, found: &'static str },
    /// A populated nested block is missing a child declared as required.
    #[error("required field '{field}' is not set")]
    MissingRequired { field: String },
}

/// Errors aborting a full-object reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// A field could not be decoded or encoded and no patch recovered it.
    #[error("field '{path}': {source}")]
    Field {
        path: FieldPath,
        #[source]
        source: CodecError,
    },
    /// The state store rejected a write.
    #[error(transparent)]
    State(#[from] StateError),
}

/// Errors raised while building or loading a [`crate::ResourceSchema`].
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("resource '{resource}': wire name '{name}' declared more than once")]
    DuplicateWireName { resource: String, name: String },
    #[error("resource '{resource}': local name '{name}' declared more than once")]
    DuplicateLocalName { resource: String, name: String },
    #[error("resource '{resource}': field '{field}' sorts on unknown child '{key}'")]
    UnknownSortKey {
        resource: String,
        field: String,
        key: String,
    },
    #[error("resource '{resource}': key field '{key}' is not a top-level field")]
    UnknownKeyField { resource: String, key: String },
    #[error("resource '{resource}': parameter '{param}' reads unknown field '{field}'")]
    UnknownParamField {
        resource: String,
        param: String,
        field: String,
    },
    #[error("failed to read schema file {path}: {source}")]
    Load {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse schema file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Errors raised by a [`crate::StateStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// Path does not address a settable location.
    #[error("invalid state path '{0}'")]
    InvalidPath(String),
    /// Typed JSON input did not match the schema.
    #[error("cannot load '{path}' from JSON: {source}")]
    Conversion {
        path: FieldPath,
        #[source]
        source: CodecError,
    },
    /// Typed JSON input was not an object.
    #[error("typed state must be a JSON object")]
    NotAnObject,
}
