//! Set and ordered-list conversion.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::CodecError;
use crate::field::{decode_scalar, encode_scalar};
use crate::schema::ScalarKind;
use crate::value::{wire_type_name, Scalar};

/// Decode a wire array into an ordered list, keeping wire order.
///
/// `null` yields an empty list. A bare scalar is treated as a one-element
/// array; `null` elements are dropped.
pub fn decode_list(kind: ScalarKind, wire: &Value) -> Result<Vec<Scalar>, CodecError> {
    match wire {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                if let Some(scalar) = decode_scalar(kind, item)? {
                    out.push(scalar);
                }
            }
            Ok(out)
        }
        Value::Object(_) => Err(CodecError::Mismatch {
            expected: "array",
            found: wire_type_name(wire),
        }),
        scalar => Ok(decode_scalar(kind, scalar)?.into_iter().collect()),
    }
}

/// Decode a wire array into an unordered set.
pub fn decode_set(kind: ScalarKind, wire: &Value) -> Result<BTreeSet<Scalar>, CodecError> {
    Ok(decode_list(kind, wire)?.into_iter().collect())
}

/// Encode a list, preserving order.
pub fn encode_list(items: &[Scalar]) -> Value {
    Value::Array(items.iter().map(encode_scalar).collect())
}

/// Encode a set in its iteration order.
pub fn encode_set(items: &BTreeSet<Scalar>) -> Value {
    Value::Array(items.iter().map(encode_scalar).collect())
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::{decode_list, decode_set, encode_list, encode_set};
    use crate::error::CodecError;
    use crate::schema::ScalarKind;
    use crate::value::Scalar;

    #[test]
    fn list_preserves_wire_order() {
        let decoded = decode_list(ScalarKind::String, &json!(["b", "a", "c"])).expect("decode");
        assert_eq!(decoded, vec![Scalar::from("b"), Scalar::from("a"), Scalar::from("c")]);
        assert_eq!(encode_list(&decoded), json!(["b", "a", "c"]));
    }

    #[test]
    fn set_discards_order_and_duplicates() {
        let decoded = decode_set(ScalarKind::String, &json!(["port2", "port1", "port2"])).expect("decode");
        assert_eq!(decoded.len(), 2);
        assert_eq!(encode_set(&decoded), json!(["port1", "port2"]));
    }

    #[test]
    fn null_and_bare_scalars() {
        assert!(decode_set(ScalarKind::String, &Value::Null).expect("decode").is_empty());
        assert_eq!(
            decode_list(ScalarKind::Integer, &json!(7)).expect("decode"),
            vec![Scalar::Int(7)]
        );
        assert_eq!(
            decode_list(ScalarKind::String, &json!(["a", null, "b"])).expect("decode").len(),
            2
        );
    }

    #[test]
    fn element_type_mismatch_fails_whole_collection() {
        assert_eq!(
            decode_list(ScalarKind::Integer, &json!([1, "two"])),
            Err(CodecError::Mismatch {
                expected: "integer",
                found: "string"
            })
        );
        assert!(decode_set(ScalarKind::String, &json!({"a": 1})).is_err());
    }
}
