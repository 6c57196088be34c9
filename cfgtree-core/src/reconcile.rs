//! Full-object decode and encode driven by a [`ResourceSchema`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ReconcileError;
use crate::nested::{Decoder, Encoder};
use crate::patch::PatchTable;
use crate::path::FieldPath;
use crate::report::{DecodeReport, FieldOutcome};
use crate::schema::{FieldKind, Naming, ResourceSchema};
use crate::state::StateStore;
use crate::value::{ConfigObject, Redacted, TypedValue};

/// State field controlling repeated-block sorting. Defaulted before each decode.
pub const DYNAMIC_SORT_SUBTABLE: &str = "dynamic_sort_subtable";

/// Read-back policy for repeated-nested fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportPolicy {
    /// Always decode repeated fields from the wire.
    Import,
    /// Decode a repeated field only if state already holds a value for it or
    /// it has a pending change.
    #[default]
    Selective,
}

impl ImportPolicy {
    pub fn from_flag(import_table: bool) -> Self {
        if import_table {
            ImportPolicy::Import
        } else {
            ImportPolicy::Selective
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub import_policy: ImportPolicy,
}

impl ReconcileOptions {
    pub fn with_import_policy(mut self, policy: ImportPolicy) -> Self {
        self.import_policy = policy;
        self
    }
}

/// Reconciles one resource's wire objects with its typed state.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler<'a> {
    schema: &'a ResourceSchema,
    patches: &'a PatchTable,
    options: ReconcileOptions,
}

impl<'a> Reconciler<'a> {
    pub fn new(schema: &'a ResourceSchema, patches: &'a PatchTable, options: ReconcileOptions) -> Self {
        Self {
            schema,
            patches,
            options,
        }
    }

    pub fn schema(&self) -> &ResourceSchema {
        self.schema
    }

    /// Pull `object` into `state`, field by field.
    ///
    /// The first field that fails to decode and has no usable patch aborts the
    /// pass; fields already written stay written.
    pub fn decode_all(
        &self,
        object: &ConfigObject,
        state: &mut dyn StateStore,
    ) -> Result<DecodeReport, ReconcileError> {
        let resource_type = self.schema.resource_type.as_str();
        let sort_path = FieldPath::root(DYNAMIC_SORT_SUBTABLE);
        if state.get_ok(&sort_path).is_none() {
            state.set(&sort_path, TypedValue::string("false"))?;
        }
        let sort_subtables = state.get(&sort_path).and_then(TypedValue::as_str) == Some("true");

        let mut decoder = Decoder::new(resource_type, Naming::Wire)
            .with_patches(self.patches)
            .sort_subtables(sort_subtables);
        let mut report = DecodeReport::new(resource_type);

        for spec in self.schema.fields.iter().filter(|f| f.is_mapped(Naming::Wire)) {
            let path = FieldPath::root(&spec.local_name);

            if matches!(spec.kind, FieldKind::Repeated(_))
                && self.options.import_policy == ImportPolicy::Selective
                && state.get_ok(&path).is_none()
                && !state.has_change(&path)
            {
                debug!(resource = resource_type, %path, "selective import: leaving field untouched");
                report.outcomes.push(FieldOutcome::Skipped { path });
                continue;
            }

            let decoded = decoder.decode_field(spec, object.get(&spec.wire_name), &path)?;
            report.outcomes.extend(decoder.take_outcomes());
            match decoded {
                Some(value) => {
                    if let Some(scalar) = value.as_scalar() {
                        debug!(resource = resource_type, %path, value = %Redacted::new(scalar, spec.sensitive), "decoded");
                    } else {
                        debug!(resource = resource_type, %path, "decoded");
                    }
                    state.set(&path, value)?;
                    report.outcomes.push(FieldOutcome::Decoded { path });
                }
                None => {
                    state.clear(&path)?;
                    report.outcomes.push(FieldOutcome::Cleared { path });
                }
            }
        }

        Ok(report)
    }

    /// Assemble a request body from `state`.
    ///
    /// Only fields with an explicit value or a pending change are emitted, and
    /// fields whose encoding is `None` are left out rather than sent as `null`.
    pub fn encode_all(&self, state: &dyn StateStore) -> Result<ConfigObject, ReconcileError> {
        let encoder = Encoder::new(state, Naming::Wire);
        let mut object = ConfigObject::new();

        for spec in self.schema.fields.iter().filter(|f| f.is_mapped(Naming::Wire)) {
            let path = FieldPath::root(&spec.local_name);
            let value = state.get(&path);
            let explicit = value.is_some_and(|v| !v.is_empty());
            if !explicit && !state.has_change(&path) {
                continue;
            }
            if let Some(wire) = encoder.encode_field(spec, value, &path)? {
                object.insert(spec.wire_name.clone(), wire);
            }
        }

        debug!(
            resource = self.schema.resource_type.as_str(),
            fields = object.len(),
            "encoded request body"
        );
        Ok(object)
    }
}
