//! Registered per-field overrides used when a wire value fails to decode.
//!
//! Entries are keyed by resource type and the field's schema path (local names
//! joined by `.`, no element indices), so a single rule covers every element
//! of a repeated block.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::CodecError;
use crate::field::decode_scalar;
use crate::schema::{FieldKind, ScalarKind};
use crate::value::{wire_type_name, Scalar, TypedValue};

/// Identity of a patchable field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatchKey {
    pub resource_type: String,
    pub field_path: String,
}

/// Substitute used when direct decode fails.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchRule {
    /// Always use this value.
    Constant(TypedValue),
    /// Loosely convert the wire value to the declared scalar type.
    Coerce,
    /// Treat the field as absent.
    Empty,
}

impl PatchRule {
    /// Produce a substitute for `wire`. `Ok(None)` means "absent".
    pub fn apply(&self, kind: &FieldKind, wire: &Value) -> Result<Option<TypedValue>, CodecError> {
        match self {
            PatchRule::Constant(value) => Ok(Some(value.clone())),
            PatchRule::Empty => Ok(None),
            PatchRule::Coerce => coerce(kind, wire),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PatchRule::Constant(_) => "constant",
            PatchRule::Coerce => "coerce",
            PatchRule::Empty => "empty",
        }
    }
}

/// Table of registered patches.
#[derive(Debug, Clone, Default)]
pub struct PatchTable {
    rules: HashMap<PatchKey, PatchRule>,
}

impl PatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule, replacing any previous rule for the same field.
    pub fn register(
        &mut self,
        resource_type: impl Into<String>,
        field_path: impl Into<String>,
        rule: PatchRule,
    ) -> &mut Self {
        self.rules.insert(
            PatchKey {
                resource_type: resource_type.into(),
                field_path: field_path.into(),
            },
            rule,
        );
        self
    }

    pub fn lookup(&self, resource_type: &str, field_path: &str) -> Option<&PatchRule> {
        self.rules.get(&PatchKey {
            resource_type: resource_type.to_string(),
            field_path: field_path.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Merge `other` into this table; entries in `other` win.
    pub fn extend(&mut self, other: PatchTable) {
        self.rules.extend(other.rules);
    }
}

fn coerce(kind: &FieldKind, wire: &Value) -> Result<Option<TypedValue>, CodecError> {
    match kind {
        FieldKind::Scalar(k) => {
            let wire = match wire {
                Value::Array(items) if items.len() <= 1 => items.first().unwrap_or(&Value::Null),
                other => other,
            };
            Ok(coerce_scalar(*k, wire)?.map(TypedValue::Scalar))
        }
        FieldKind::Set(k) | FieldKind::List(k) => {
            let items = match wire {
                Value::Array(items) => items
                    .iter()
                    .map(|item| coerce_scalar(*k, item))
                    .collect::<Result<Vec<_>, _>>()?,
                Value::Object(_) => return Err(unsupported(wire)),
                scalar => vec![coerce_scalar(*k, scalar)?],
            };
            let items: Vec<Scalar> = items.into_iter().flatten().collect();
            if items.is_empty() {
                return Ok(None);
            }
            Ok(Some(match kind {
                FieldKind::Set(_) => TypedValue::Set(items.into_iter().collect()),
                _ => TypedValue::List(items),
            }))
        }
        FieldKind::Single(_) | FieldKind::Repeated(_) => Err(unsupported(wire)),
    }
}

fn coerce_scalar(kind: ScalarKind, wire: &Value) -> Result<Option<Scalar>, CodecError> {
    if let Ok(direct) = decode_scalar(kind, wire) {
        return Ok(direct);
    }
    let coerced = match (kind, wire) {
        (ScalarKind::String, Value::Number(n)) => Some(Scalar::Str(n.to_string())),
        (ScalarKind::String, Value::Bool(b)) => {
            Some(Scalar::from(if *b { "enable" } else { "disable" }))
        }
        (ScalarKind::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Scalar::Int),
        (ScalarKind::Integer, Value::Bool(b)) => Some(Scalar::Int(i64::from(*b))),
        (ScalarKind::Integer, Value::Number(n)) => n.as_f64().and_then(integral).map(Scalar::Int),
        (ScalarKind::Bool, Value::String(s)) => match s.trim() {
            "enable" | "true" | "1" => Some(Scalar::Bool(true)),
            "disable" | "false" | "0" => Some(Scalar::Bool(false)),
            _ => None,
        },
        (ScalarKind::Bool, Value::Number(n)) => n.as_i64().map(|i| Scalar::Bool(i != 0)),
        _ => None,
    };
    coerced.map(Some).ok_or_else(|| CodecError::Mismatch {
        expected: kind.name(),
        found: wire_type_name(wire),
    })
}

/// Whole floats inside the `i64` range; anything else is not coercible.
fn integral(f: f64) -> Option<i64> {
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then(|| f as i64)
}

fn unsupported(wire: &Value) -> CodecError {
    CodecError::Mismatch {
        expected: "coercible value",
        found: wire_type_name(wire),
    }
}
