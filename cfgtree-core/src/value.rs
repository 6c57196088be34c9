use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use serde_json::Value;

/// Untyped object exchanged with the device API, keyed by kebab-case wire name.
pub type ConfigObject = serde_json::Map<String, Value>;

/// Typed fields of one block, keyed by snake_case local name.
pub type TypedBlock = BTreeMap<String, TypedValue>;

/// A single typed leaf value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// Typed value of one field, shaped by the field's cardinality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    Scalar(Scalar),
    Set(BTreeSet<Scalar>),
    List(Vec<Scalar>),
    Block(TypedBlock),
    Blocks(Vec<TypedBlock>),
}

impl TypedValue {
    /// True for values the framework treats as "not explicitly set".
    pub fn is_empty(&self) -> bool {
        match self {
            TypedValue::Scalar(Scalar::Str(s)) => s.is_empty(),
            TypedValue::Scalar(_) => false,
            TypedValue::Set(set) => set.is_empty(),
            TypedValue::List(list) => list.is_empty(),
            TypedValue::Block(block) => block.values().all(TypedValue::is_empty),
            TypedValue::Blocks(blocks) => blocks.is_empty(),
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            TypedValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    pub fn as_blocks(&self) -> Option<&[TypedBlock]> {
        match self {
            TypedValue::Blocks(blocks) => Some(blocks),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&TypedBlock> {
        match self {
            TypedValue::Block(block) => Some(block),
            _ => None,
        }
    }

    /// Convenience for string scalars.
    pub fn string(value: impl Into<String>) -> Self {
        TypedValue::Scalar(Scalar::Str(value.into()))
    }

    /// Convenience for a set of strings.
    pub fn string_set<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypedValue::Set(values.into_iter().map(|v| Scalar::Str(v.into())).collect())
    }
}

impl From<Scalar> for TypedValue {
    fn from(value: Scalar) -> Self {
        TypedValue::Scalar(value)
    }
}

/// Short name of a JSON value's shape, for error messages.
pub fn wire_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Display wrapper that hides the value of sensitive fields.
pub struct Redacted<'a, T: Display> {
    value: &'a T,
    sensitive: bool,
}

impl<'a, T: Display> Redacted<'a, T> {
    pub fn new(value: &'a T, sensitive: bool) -> Self {
        Self { value, sensitive }
    }
}

impl<T: Display> Display for Redacted<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.sensitive {
            write!(f, "<redacted>")
        } else {
            write!(f, "{}", self.value)
        }
    }
}
