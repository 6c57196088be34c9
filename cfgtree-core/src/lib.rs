//! Generic reconciliation between typed configuration state and the untyped
//! JSON objects a device management API reads and writes.
//!
//! A [`ResourceSchema`] declares each field's wire name, local name and
//! cardinality. The codecs in [`field`], [`collection`] and [`nested`] convert
//! single fields; the [`Reconciler`] drives a whole object through them,
//! applying the import policy on read, patch fallback on decode failures and
//! partial-update minimality on write.

pub mod collection;
pub mod error;
pub mod field;
pub mod format;
pub mod nested;
pub mod patch;
pub mod path;
pub mod reconcile;
pub mod report;
pub mod schema;
pub mod state;
pub mod value;

pub use error::{CodecError, ReconcileError, SchemaError, StateError};
pub use format::{format_json, format_summary, format_text};
pub use patch::{PatchKey, PatchRule, PatchTable};
pub use path::{FieldPath, Segment};
pub use reconcile::{ImportPolicy, ReconcileOptions, Reconciler, DYNAMIC_SORT_SUBTABLE};
pub use report::{DecodeReport, FieldOutcome};
pub use schema::{FieldKind, FieldSpec, Naming, ParamSpec, ResourceSchema, ScalarKind};
pub use state::{typed_block_from_json, MemoryState, StateStore};
pub use value::{ConfigObject, Redacted, Scalar, TypedBlock, TypedValue};
