//! Recursive conversion of single and repeated nested objects.
//!
//! [`Decoder`] and [`Encoder`] dispatch on [`FieldKind`] for every field, so
//! they are also the entry points for scalar and collection fields inside
//! nested blocks. Element paths follow the `<field>.<N>.<child>` form.

use std::cmp::Ordering;

use serde_json::Value;
use tracing::{debug, warn};

use crate::collection::{decode_list, decode_set, encode_list, encode_set};
use crate::error::{CodecError, ReconcileError};
use crate::field::{decode_scalar, encode_scalar};
use crate::patch::PatchTable;
use crate::path::FieldPath;
use crate::report::FieldOutcome;
use crate::schema::{FieldKind, FieldSpec, Naming};
use crate::state::StateStore;
use crate::value::{wire_type_name, ConfigObject, Redacted, TypedBlock, TypedValue};

enum Failure {
    /// The field at the current path failed; patchable.
    Here(CodecError),
    /// Wire shape does not fit a nested kind; patchable, otherwise the field
    /// is skipped as malformed.
    Shape(CodecError),
    /// A descendant failed and could not be recovered.
    Child(ReconcileError),
}

impl From<ReconcileError> for Failure {
    fn from(err: ReconcileError) -> Self {
        Failure::Child(err)
    }
}

/// Wire (or typed JSON) to typed state.
pub struct Decoder<'a> {
    resource_type: &'a str,
    patches: Option<&'a PatchTable>,
    naming: Naming,
    sort_subtables: bool,
    reject_malformed: bool,
    outcomes: Vec<FieldOutcome>,
}

impl<'a> Decoder<'a> {
    pub fn new(resource_type: &'a str, naming: Naming) -> Self {
        Self {
            resource_type,
            patches: None,
            naming,
            sort_subtables: false,
            reject_malformed: false,
            outcomes: Vec::new(),
        }
    }

    pub fn with_patches(mut self, patches: &'a PatchTable) -> Self {
        self.patches = Some(patches);
        self
    }

    /// Order repeated blocks by their declared sort key.
    pub fn sort_subtables(mut self, enabled: bool) -> Self {
        self.sort_subtables = enabled;
        self
    }

    /// Fail on misshapen nested values and elements instead of skipping them.
    pub fn reject_malformed(mut self, enabled: bool) -> Self {
        self.reject_malformed = enabled;
        self
    }

    /// Patched and malformed outcomes collected so far.
    pub fn take_outcomes(&mut self) -> Vec<FieldOutcome> {
        std::mem::take(&mut self.outcomes)
    }

    /// Decode one field. `None` wire input and empty results yield `Ok(None)`.
    pub fn decode_field(
        &mut self,
        spec: &FieldSpec,
        wire: Option<&Value>,
        path: &FieldPath,
    ) -> Result<Option<TypedValue>, ReconcileError> {
        let wire = wire.unwrap_or(&Value::Null);
        match self.decode_kind(spec, wire, path) {
            Ok(value) => Ok(value),
            Err(Failure::Child(err)) => Err(err),
            Err(Failure::Here(source)) => self.recover(spec, wire, path, source),
            Err(Failure::Shape(source)) => match self.recover(spec, wire, path, source) {
                Err(ReconcileError::Field { path, source }) if !self.reject_malformed => {
                    let reason = source.to_string();
                    warn!(resource = self.resource_type, %path, %reason, "skipping malformed field");
                    self.outcomes.push(FieldOutcome::Malformed { path, reason });
                    Ok(None)
                }
                other => other,
            },
        }
    }

    /// Decode every child of a block from `object`.
    pub fn decode_block(
        &mut self,
        children: &[FieldSpec],
        object: &ConfigObject,
        path: &FieldPath,
    ) -> Result<TypedBlock, ReconcileError> {
        let mut block = TypedBlock::new();
        let naming = self.naming;
        for child in children.iter().filter(|c| c.is_mapped(naming)) {
            let child_path = if path.is_empty() {
                FieldPath::root(&child.local_name)
            } else {
                path.child(&child.local_name)
            };
            let wire = object.get(child.name_for(naming));
            if let Some(value) = self.decode_field(child, wire, &child_path)? {
                block.insert(child.local_name.clone(), value);
            }
        }
        Ok(block)
    }

    fn decode_kind(
        &mut self,
        spec: &FieldSpec,
        wire: &Value,
        path: &FieldPath,
    ) -> Result<Option<TypedValue>, Failure> {
        let value = match &spec.kind {
            FieldKind::Scalar(kind) => decode_scalar(*kind, wire)
                .map_err(Failure::Here)?
                .map(TypedValue::Scalar),
            FieldKind::Set(kind) => {
                let set = decode_set(*kind, wire).map_err(Failure::Here)?;
                (!set.is_empty()).then_some(TypedValue::Set(set))
            }
            FieldKind::List(kind) => {
                let list = decode_list(*kind, wire).map_err(Failure::Here)?;
                (!list.is_empty()).then_some(TypedValue::List(list))
            }
            FieldKind::Single(children) => self.decode_single(children, wire, path)?,
            FieldKind::Repeated(children) => {
                let mut blocks = self.decode_repeated(children, wire, path)?;
                if self.sort_subtables {
                    if let Some(key) = &spec.sort_key {
                        blocks.sort_by(|a, b| compare_sort_key(a.get(key), b.get(key)));
                    }
                }
                (!blocks.is_empty()).then_some(TypedValue::Blocks(blocks))
            }
        };
        Ok(value)
    }

    fn decode_single(
        &mut self,
        children: &[FieldSpec],
        wire: &Value,
        path: &FieldPath,
    ) -> Result<Option<TypedValue>, Failure> {
        let object = match wire {
            Value::Null => return Ok(None),
            Value::Object(object) => object,
            Value::Array(items) => match items.first() {
                None | Some(Value::Null) => return Ok(None),
                Some(Value::Object(object)) if items.len() == 1 => object,
                Some(_) => return Err(Failure::Shape(object_mismatch(wire))),
            },
            _ => return Err(Failure::Shape(object_mismatch(wire))),
        };
        let block = self.decode_block(children, object, path)?;
        Ok((!block.is_empty()).then_some(TypedValue::Block(block)))
    }

    fn decode_repeated(
        &mut self,
        children: &[FieldSpec],
        wire: &Value,
        path: &FieldPath,
    ) -> Result<Vec<TypedBlock>, Failure> {
        let items = match wire {
            Value::Null => return Ok(Vec::new()),
            Value::Array(items) => items.as_slice(),
            Value::Object(_) => std::slice::from_ref(wire),
            _ => {
                return Err(Failure::Shape(CodecError::Mismatch {
                    expected: "array",
                    found: wire_type_name(wire),
                }))
            }
        };

        let mut blocks = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let element_path = path.index(index);
            match item {
                Value::Object(object) => {
                    blocks.push(self.decode_block(children, object, &element_path)?);
                }
                other => {
                    let source = CodecError::MalformedElement {
                        index,
                        found: wire_type_name(other),
                    };
                    if self.reject_malformed {
                        return Err(Failure::Child(ReconcileError::Field {
                            path: element_path,
                            source,
                        }));
                    }
                    let reason = source.to_string();
                    warn!(resource = self.resource_type, path = %element_path, %reason, "skipping malformed element");
                    self.outcomes.push(FieldOutcome::Malformed {
                        path: element_path,
                        reason,
                    });
                }
            }
        }
        Ok(blocks)
    }

    fn recover(
        &mut self,
        spec: &FieldSpec,
        wire: &Value,
        path: &FieldPath,
        source: CodecError,
    ) -> Result<Option<TypedValue>, ReconcileError> {
        let rule = self
            .patches
            .and_then(|patches| patches.lookup(self.resource_type, &path.schema_key()));
        let Some(rule) = rule else {
            return Err(ReconcileError::Field {
                path: path.clone(),
                source,
            });
        };

        match rule.apply(&spec.kind, wire) {
            Ok(value) => {
                let reason = format!("{source}; applied {} patch", rule.name());
                warn!(
                    resource = self.resource_type,
                    %path,
                    wire = %Redacted::new(wire, spec.sensitive),
                    %reason,
                    "field patched"
                );
                self.outcomes.push(FieldOutcome::Patched {
                    path: path.clone(),
                    reason,
                });
                Ok(value)
            }
            Err(patch_err) => {
                debug!(resource = self.resource_type, %path, %patch_err, "patch did not apply");
                Err(ReconcileError::Field {
                    path: path.clone(),
                    source,
                })
            }
        }
    }
}

/// Typed state to wire.
pub struct Encoder<'a> {
    state: &'a dyn StateStore,
    naming: Naming,
}

impl<'a> Encoder<'a> {
    pub fn new(state: &'a dyn StateStore, naming: Naming) -> Self {
        Self { state, naming }
    }

    /// Encode one field. `Ok(None)` means the field must be omitted.
    ///
    /// An absent collection encodes to `[]` so that callers emitting it because
    /// of a pending change clear it on the device.
    pub fn encode_field(
        &self,
        spec: &FieldSpec,
        value: Option<&TypedValue>,
        path: &FieldPath,
    ) -> Result<Option<Value>, ReconcileError> {
        let encoded = match (&spec.kind, value) {
            (FieldKind::Scalar(_), None) | (FieldKind::Single(_), None) => None,
            (FieldKind::Set(_), None)
            | (FieldKind::List(_), None)
            | (FieldKind::Repeated(_), None) => Some(Value::Array(Vec::new())),
            (FieldKind::Scalar(_), Some(TypedValue::Scalar(s))) => Some(encode_scalar(s)),
            (FieldKind::Set(_), Some(TypedValue::Set(set))) => Some(encode_set(set)),
            (FieldKind::List(_), Some(TypedValue::List(list))) => Some(encode_list(list)),
            (FieldKind::Single(children), Some(TypedValue::Block(block))) => self
                .encode_block(children, block, path)?
                .map(Value::Object),
            (FieldKind::Repeated(children), Some(TypedValue::Blocks(blocks))) => {
                let mut items = Vec::with_capacity(blocks.len());
                for (index, block) in blocks.iter().enumerate() {
                    if let Some(object) = self.encode_block(children, block, &path.index(index))? {
                        items.push(Value::Object(object));
                    }
                }
                Some(Value::Array(items))
            }
            (kind, Some(other)) => {
                return Err(ReconcileError::Field {
                    path: path.clone(),
                    source: CodecError::Mismatch {
                        expected: kind.label(),
                        found: typed_kind_name(other),
                    },
                })
            }
        };
        Ok(encoded)
    }

    /// Encode a nested block. Returns `None` when no child was populated.
    pub fn encode_block(
        &self,
        children: &[FieldSpec],
        block: &TypedBlock,
        path: &FieldPath,
    ) -> Result<Option<ConfigObject>, ReconcileError> {
        let mut object = ConfigObject::new();
        let mut populated = false;
        let mut missing = None;

        for child in children.iter().filter(|c| c.is_mapped(self.naming)) {
            let child_path = path.child(&child.local_name);
            let value = block.get(&child.local_name);
            let explicit = value.is_some_and(|v| !v.is_empty());
            populated |= explicit;
            if child.required && !explicit && missing.is_none() {
                missing = Some(child_path.clone());
            }
            if !explicit && !self.state.has_change(&child_path) {
                continue;
            }
            if let Some(wire) = self.encode_field(child, value, &child_path)? {
                object.insert(child.name_for(self.naming).to_string(), wire);
            }
        }

        if !populated {
            return Ok(None);
        }
        if let Some(path) = missing {
            let field = path.schema_key();
            return Err(ReconcileError::Field {
                path,
                source: CodecError::MissingRequired { field },
            });
        }
        Ok(Some(object))
    }
}

fn object_mismatch(wire: &Value) -> CodecError {
    CodecError::Mismatch {
        expected: "object",
        found: wire_type_name(wire),
    }
}

fn typed_kind_name(value: &TypedValue) -> &'static str {
    match value {
        TypedValue::Scalar(_) => "scalar",
        TypedValue::Set(_) => "set",
        TypedValue::List(_) => "list",
        TypedValue::Block(_) => "single",
        TypedValue::Blocks(_) => "repeated",
    }
}

/// Blocks without the key sort after blocks that have one.
fn compare_sort_key(a: Option<&TypedValue>, b: Option<&TypedValue>) -> Ordering {
    match (a.and_then(TypedValue::as_scalar), b.and_then(TypedValue::as_scalar)) {
        (Some(a), Some(b)) => natural_cmp(&a.to_string(), &b.to_string()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Compare strings treating runs of ASCII digits as numbers (`port2 < port10`).
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();
    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let ln = take_number(&mut left);
                let rn = take_number(&mut right);
                let ord = ln
                    .trim_start_matches('0')
                    .len()
                    .cmp(&rn.trim_start_matches('0').len())
                    .then_with(|| ln.trim_start_matches('0').cmp(rn.trim_start_matches('0')));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    use super::{natural_cmp, Decoder, Encoder};
    use crate::error::{CodecError, ReconcileError};
    use crate::path::FieldPath;
    use crate::patch::{PatchRule, PatchTable};
    use crate::report::FieldOutcome;
    use crate::schema::{FieldSpec, Naming};
    use crate::state::MemoryState;
    use crate::value::{TypedBlock, TypedValue};

    fn ip_range() -> FieldSpec {
        FieldSpec::repeated(
            "ip-range",
            vec![
                FieldSpec::integer("id"),
                FieldSpec::string("start-ip"),
                FieldSpec::string("end-ip"),
            ],
        )
        .sort_key("id")
    }

    fn range(id: i64, start: &str) -> TypedBlock {
        let mut block = TypedBlock::new();
        block.insert("id".to_string(), TypedValue::Scalar(id.into()));
        block.insert("start_ip".to_string(), TypedValue::string(start));
        block
    }

    #[test]
    fn repeated_decode_skips_malformed_elements() {
        let spec = ip_range();
        let wire = json!([{"id": 1, "start-ip": "10.0.0.1"}, "garbage", {"id": 2}]);
        let mut decoder = Decoder::new("demo", Naming::Wire);

        let decoded = decoder
            .decode_field(&spec, Some(&wire), &FieldPath::root("ip_range"))
            .expect("decode");
        let blocks = decoded.as_ref().and_then(TypedValue::as_blocks).expect("blocks");
        assert_eq!(blocks.len(), 2);

        let outcomes = decoder.take_outcomes();
        assert!(matches!(
            &outcomes[..],
            [FieldOutcome::Malformed { path, .. }] if path.to_string() == "ip_range.1"
        ));
    }

    #[test]
    fn child_error_reports_synthetic_index_path() {
        let spec = ip_range();
        let wire = json!([{"id": 1}, {"id": "two"}]);
        let mut decoder = Decoder::new("demo", Naming::Wire);

        let err = decoder
            .decode_field(&spec, Some(&wire), &FieldPath::root("ip_range"))
            .expect_err("should fail");
        match err {
            ReconcileError::Field { path, .. } => assert_eq!(path.to_string(), "ip_range.1.id"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn single_nested_unwraps_pseudo_lists() {
        let spec = FieldSpec::single("mirror", vec![FieldSpec::string("interface")]);
        let mut decoder = Decoder::new("demo", Naming::Wire);
        let path = FieldPath::root("mirror");

        let wrapped = decoder
            .decode_field(&spec, Some(&json!([{"interface": "port3"}])), &path)
            .expect("decode");
        let plain = decoder
            .decode_field(&spec, Some(&json!({"interface": "port3"})), &path)
            .expect("decode");
        assert_eq!(wrapped, plain);
        assert!(wrapped.is_some());

        for absent in [Value::Null, json!([]), json!([null])] {
            assert_eq!(decoder.decode_field(&spec, Some(&absent), &path), Ok(None));
        }
        decoder.take_outcomes();

        for malformed in [json!("port3"), json!([{"interface": "port3"}, {"interface": "port4"}])] {
            assert_eq!(decoder.decode_field(&spec, Some(&malformed), &path), Ok(None));
            let outcomes = decoder.take_outcomes();
            assert!(matches!(
                &outcomes[..],
                [FieldOutcome::Malformed { path, .. }] if path.to_string() == "mirror"
            ));
        }
    }

    #[test]
    fn repeated_decode_wraps_a_bare_object() {
        let spec = ip_range();
        let mut decoder = Decoder::new("demo", Naming::Wire);
        let path = FieldPath::root("ip_range");

        let decoded = decoder
            .decode_field(&spec, Some(&json!({"id": 1, "start-ip": "10.0.0.1"})), &path)
            .expect("decode");
        assert_eq!(decoded, Some(TypedValue::Blocks(vec![range(1, "10.0.0.1")])));

        assert_eq!(decoder.decode_field(&spec, Some(&json!("10.0.0.1")), &path), Ok(None));
        assert!(matches!(
            &decoder.take_outcomes()[..],
            [FieldOutcome::Malformed { path, .. }] if path.to_string() == "ip_range"
        ));
    }

    #[test]
    fn shape_errors_still_go_through_patches() {
        let spec = FieldSpec::single("mirror", vec![FieldSpec::string("interface")]);
        let mut patches = PatchTable::new();
        patches.register("demo", "mirror", PatchRule::Empty);
        let mut decoder = Decoder::new("demo", Naming::Wire).with_patches(&patches);

        assert_eq!(
            decoder.decode_field(&spec, Some(&json!("port3")), &FieldPath::root("mirror")),
            Ok(None)
        );
        assert!(matches!(&decoder.take_outcomes()[..], [FieldOutcome::Patched { .. }]));
    }

    #[test]
    fn sort_subtables_orders_by_key_naturally() {
        let spec = ip_range();
        let wire = json!([{"id": 10}, {"id": 2}, {"start-ip": "x"}, {"id": 1}]);
        let mut decoder = Decoder::new("demo", Naming::Wire).sort_subtables(true);

        let decoded = decoder
            .decode_field(&spec, Some(&wire), &FieldPath::root("ip_range"))
            .expect("decode")
            .expect("present");
        let ids: Vec<Option<String>> = decoded
            .as_blocks()
            .expect("blocks")
            .iter()
            .map(|b| b.get("id").and_then(TypedValue::as_scalar).map(ToString::to_string))
            .collect();
        assert_eq!(
            ids,
            vec![Some("1".to_string()), Some("2".to_string()), Some("10".to_string()), None]
        );
    }

    #[test]
    fn encode_drops_unpopulated_blocks_and_keeps_order() {
        let spec = ip_range();
        let state = MemoryState::default();
        let encoder = Encoder::new(&state, Naming::Wire);
        let value = TypedValue::Blocks(vec![range(2, "10.0.1.1"), TypedBlock::new(), range(1, "10.0.0.1")]);

        let wire = encoder
            .encode_field(&spec, Some(&value), &FieldPath::root("ip_range"))
            .expect("encode");
        assert_eq!(
            wire,
            Some(json!([
                {"id": 2, "start-ip": "10.0.1.1"},
                {"id": 1, "start-ip": "10.0.0.1"}
            ]))
        );
    }

    #[test]
    fn encode_rejects_populated_block_missing_required_child() {
        let spec = FieldSpec::repeated(
            "options",
            vec![FieldSpec::integer("code").required(), FieldSpec::string("value")],
        );
        let mut block = TypedBlock::new();
        block.insert("value".to_string(), TypedValue::string("x"));
        let state = MemoryState::default();
        let encoder = Encoder::new(&state, Naming::Wire);

        let err = encoder
            .encode_field(&spec, Some(&TypedValue::Blocks(vec![block])), &FieldPath::root("options"))
            .expect_err("missing required");
        assert!(matches!(
            err,
            ReconcileError::Field { source: CodecError::MissingRequired { .. }, ref path }
                if path.to_string() == "options.0.code"
        ));
    }

    #[test]
    fn natural_ordering_compares_digit_runs_numerically() {
        assert_eq!(natural_cmp("port2", "port10"), Ordering::Less);
        assert_eq!(natural_cmp("10", "9"), Ordering::Greater);
        assert_eq!(natural_cmp("abc", "abc"), Ordering::Equal);
    }
}
