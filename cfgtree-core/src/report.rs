use serde::Serialize;

use crate::path::FieldPath;

/// What decode-all did with one field or repeated element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum FieldOutcome {
    /// Wire value decoded directly and written to state.
    Decoded { path: FieldPath },
    /// Direct decode failed; a registered patch supplied the value.
    Patched { path: FieldPath, reason: String },
    /// Wire value absent or empty; state field cleared.
    Cleared { path: FieldPath },
    /// Left untouched by the selective import policy.
    Skipped { path: FieldPath },
    /// Repeated element that was not an object; dropped.
    Malformed { path: FieldPath, reason: String },
}

impl FieldOutcome {
    pub fn path(&self) -> &FieldPath {
        match self {
            FieldOutcome::Decoded { path }
            | FieldOutcome::Patched { path, .. }
            | FieldOutcome::Cleared { path }
            | FieldOutcome::Skipped { path }
            | FieldOutcome::Malformed { path, .. } => path,
        }
    }
}

/// Per-field account of one decode-all pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecodeReport {
    pub resource_type: String,
    pub outcomes: Vec<FieldOutcome>,
}

impl DecodeReport {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            outcomes: Vec::new(),
        }
    }

    /// Outcomes recorded for `path` (rendered form, e.g. `ip_range.1`).
    pub fn outcomes_for<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a FieldOutcome> {
        self.outcomes
            .iter()
            .filter(move |o| o.path().to_string() == path)
    }

    pub fn was_skipped(&self, path: &str) -> bool {
        self.outcomes_for(path)
            .any(|o| matches!(o, FieldOutcome::Skipped { .. }))
    }

    pub fn was_patched(&self, path: &str) -> bool {
        self.outcomes_for(path)
            .any(|o| matches!(o, FieldOutcome::Patched { .. }))
    }
}
