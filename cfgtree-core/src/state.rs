//! Typed state storage and change tracking.

use serde_json::Value;

use crate::error::{ReconcileError, StateError};
use crate::nested::Decoder;
use crate::path::{FieldPath, Segment};
use crate::schema::{FieldSpec, Naming};
use crate::value::{TypedBlock, TypedValue};

/// Read/write access to the typed state of one resource instance.
pub trait StateStore {
    /// Value at `path`, if any.
    fn get(&self, path: &FieldPath) -> Option<&TypedValue>;

    /// Replace the value at `path`. The parent block must exist.
    fn set(&mut self, path: &FieldPath, value: TypedValue) -> Result<(), StateError>;

    /// Remove the value at `path`.
    fn clear(&mut self, path: &FieldPath) -> Result<(), StateError>;

    /// Whether `path` differs from the last known state.
    fn has_change(&self, path: &FieldPath) -> bool;

    /// Value at `path` only if it is present and non-empty.
    fn get_ok(&self, path: &FieldPath) -> Option<&TypedValue> {
        self.get(path).filter(|v| !v.is_empty())
    }
}

/// In-memory state holding the current values and the last committed snapshot.
///
/// `has_change` compares the two, treating empty and absent as equal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryState {
    current: TypedBlock,
    prior: TypedBlock,
}

impl MemoryState {
    /// State with no pending changes.
    pub fn new(current: TypedBlock) -> Self {
        Self {
            prior: current.clone(),
            current,
        }
    }

    /// State whose differences from `prior` count as pending changes.
    pub fn with_prior(current: TypedBlock, prior: TypedBlock) -> Self {
        Self { current, prior }
    }

    pub fn current(&self) -> &TypedBlock {
        &self.current
    }

    pub fn prior(&self) -> &TypedBlock {
        &self.prior
    }

    pub fn into_current(self) -> TypedBlock {
        self.current
    }

    /// Accept current values as the new baseline.
    pub fn commit(&mut self) {
        self.prior = self.current.clone();
    }

    /// Drop all current values, e.g. after the remote object disappeared.
    pub fn reset(&mut self) {
        self.current.clear();
    }
}

impl StateStore for MemoryState {
    fn get(&self, path: &FieldPath) -> Option<&TypedValue> {
        lookup(&self.current, path)
    }

    fn set(&mut self, path: &FieldPath, value: TypedValue) -> Result<(), StateError> {
        let (parent, name) = parent_block_mut(&mut self.current, path)?;
        parent.insert(name, value);
        Ok(())
    }

    fn clear(&mut self, path: &FieldPath) -> Result<(), StateError> {
        let (parent, name) = parent_block_mut(&mut self.current, path)?;
        parent.remove(&name);
        Ok(())
    }

    fn has_change(&self, path: &FieldPath) -> bool {
        let now = lookup(&self.current, path).filter(|v| !v.is_empty());
        let before = lookup(&self.prior, path).filter(|v| !v.is_empty());
        now != before
    }
}

/// Load a typed block from JSON keyed by local names (the form typed state is
/// exported in), validating shapes against `fields`. Misshapen nested values
/// are errors here rather than skipped.
pub fn typed_block_from_json(fields: &[FieldSpec], json: &Value) -> Result<TypedBlock, StateError> {
    let object = json.as_object().ok_or(StateError::NotAnObject)?;
    let mut decoder = Decoder::new("typed-state", Naming::Local).reject_malformed(true);
    decoder
        .decode_block(fields, object, &FieldPath::default())
        .map_err(|err| match err {
            ReconcileError::Field { path, source } => StateError::Conversion { path, source },
            ReconcileError::State(state) => state,
        })
}

fn lookup<'a>(root: &'a TypedBlock, path: &FieldPath) -> Option<&'a TypedValue> {
    let mut block = root;
    let mut segments = path.segments().iter().peekable();
    while let Some(segment) = segments.next() {
        let Segment::Field(name) = segment else {
            return None;
        };
        let value = block.get(name)?;
        match segments.peek() {
            None => return Some(value),
            Some(Segment::Field(_)) => block = value.as_block()?,
            Some(Segment::Index(i)) => {
                block = value.as_blocks()?.get(*i)?;
                segments.next();
            }
        }
    }
    None
}

fn parent_block_mut<'a>(
    root: &'a mut TypedBlock,
    path: &FieldPath,
) -> Result<(&'a mut TypedBlock, String), StateError> {
    let invalid = || StateError::InvalidPath(path.to_string());
    let Some((Segment::Field(last), parents)) = path.segments().split_last() else {
        return Err(invalid());
    };

    let mut block = root;
    let mut segments = parents.iter().peekable();
    while let Some(segment) = segments.next() {
        let Segment::Field(name) = segment else {
            return Err(invalid());
        };
        let value = block.get_mut(name).ok_or_else(invalid)?;
        block = match (value, segments.peek()) {
            (TypedValue::Blocks(blocks), Some(Segment::Index(i))) => {
                let i = *i;
                segments.next();
                blocks.get_mut(i).ok_or_else(invalid)?
            }
            (TypedValue::Block(inner), None | Some(Segment::Field(_))) => inner,
            _ => return Err(invalid()),
        };
    }
    Ok((block, last.clone()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{typed_block_from_json, MemoryState, StateStore};
    use crate::error::{CodecError, StateError};
    use crate::path::FieldPath;
    use crate::schema::FieldSpec;
    use crate::value::{TypedBlock, TypedValue};

    fn ranges(starts: &[&str]) -> TypedValue {
        TypedValue::Blocks(
            starts
                .iter()
                .map(|s| {
                    let mut b = TypedBlock::new();
                    b.insert("start_ip".to_string(), TypedValue::string(*s));
                    b
                })
                .collect(),
        )
    }

    #[test]
    fn get_and_set_through_repeated_elements() {
        let mut block = TypedBlock::new();
        block.insert("ip_range".to_string(), ranges(&["10.0.0.1", "10.0.1.1"]));
        let mut state = MemoryState::new(block);

        let path: FieldPath = "ip_range.1.start_ip".parse().expect("path");
        assert_eq!(state.get(&path), Some(&TypedValue::string("10.0.1.1")));
        assert!(!state.has_change(&path));

        state
            .set(&path, TypedValue::string("10.0.2.1"))
            .expect("set");
        assert!(state.has_change(&path));
        assert!(!state.has_change(&"ip_range.0.start_ip".parse().expect("path")));

        state.commit();
        assert!(!state.has_change(&path));
    }

    #[test]
    fn empty_and_absent_are_not_a_change() {
        let mut prior = TypedBlock::new();
        prior.insert("interface".to_string(), TypedValue::string(""));
        let state = MemoryState::with_prior(TypedBlock::new(), prior);
        assert!(!state.has_change(&FieldPath::root("interface")));
        assert!(state.get_ok(&FieldPath::root("interface")).is_none());
    }

    #[test]
    fn set_rejects_paths_without_parent() {
        let mut state = MemoryState::default();
        let err = state
            .set(&"ip_range.0.start_ip".parse().expect("path"), TypedValue::string("x"))
            .expect_err("no parent");
        assert_eq!(err, StateError::InvalidPath("ip_range.0.start_ip".to_string()));
    }

    #[test]
    fn loads_typed_json_with_local_names() {
        let fields = vec![
            FieldSpec::string("dns-server1"),
            FieldSpec::repeated("ip-range", vec![FieldSpec::string("start-ip")]),
        ];
        let block = typed_block_from_json(
            &fields,
            &json!({"dns_server1": "8.8.8.8", "ip_range": [{"start_ip": "10.0.0.1"}]}),
        )
        .expect("load");
        assert_eq!(block.get("dns_server1"), Some(&TypedValue::string("8.8.8.8")));
        assert_eq!(block.get("ip_range"), Some(&ranges(&["10.0.0.1"])));

        let err = typed_block_from_json(&fields, &json!({"dns_server1": 8})).expect_err("bad type");
        assert!(matches!(err, StateError::Conversion { .. }));
        assert_eq!(typed_block_from_json(&fields, &json!([])), Err(StateError::NotAnObject));
    }

    #[test]
    fn typed_json_rejects_misshapen_nested_values() {
        let fields = vec![
            FieldSpec::single("mirror", vec![FieldSpec::string("interface")]),
            FieldSpec::repeated("ip-range", vec![FieldSpec::string("start-ip")]),
        ];

        let err = typed_block_from_json(&fields, &json!({"ip_range": ["bogus"]}))
            .expect_err("bad element");
        match err {
            StateError::Conversion { path, source } => {
                assert_eq!(path.to_string(), "ip_range.0");
                assert_eq!(
                    source,
                    CodecError::MalformedElement {
                        index: 0,
                        found: "string"
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = typed_block_from_json(&fields, &json!({"mirror": "port3"})).expect_err("scalar");
        assert!(matches!(err, StateError::Conversion { path, .. } if path.to_string() == "mirror"));
    }
}
