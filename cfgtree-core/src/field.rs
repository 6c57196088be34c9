//! Scalar conversion between wire JSON and [`Scalar`].

use serde_json::Value;

use crate::error::CodecError;
use crate::schema::ScalarKind;
use crate::value::{wire_type_name, Scalar};

/// Decode one wire scalar, asserting its type. `null` decodes to `None`.
pub fn decode_scalar(kind: ScalarKind, wire: &Value) -> Result<Option<Scalar>, CodecError> {
    let scalar = match (kind, wire) {
        (_, Value::Null) => return Ok(None),
        (ScalarKind::String, Value::String(s)) => Scalar::Str(s.clone()),
        (ScalarKind::Integer, Value::Number(n)) => match n.as_i64() {
            Some(i) => Scalar::Int(i),
            None => return Err(mismatch(kind, wire)),
        },
        (ScalarKind::Bool, Value::Bool(b)) => Scalar::Bool(*b),
        _ => return Err(mismatch(kind, wire)),
    };
    Ok(Some(scalar))
}

/// Encode a typed scalar into its wire form.
pub fn encode_scalar(scalar: &Scalar) -> Value {
    match scalar {
        Scalar::Str(s) => Value::String(s.clone()),
        Scalar::Int(i) => Value::from(*i),
        Scalar::Bool(b) => Value::Bool(*b),
    }
}

pub(crate) fn mismatch(kind: ScalarKind, wire: &Value) -> CodecError {
    CodecError::Mismatch {
        expected: kind.name(),
        found: wire_type_name(wire),
    }
}
