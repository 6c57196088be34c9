use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Named field inside a block.
    Field(String),
    /// Position inside a repeated-nested field.
    Index(usize),
}

/// Dotted path addressing a value inside typed state, e.g. `ip_range.0.start_ip`.
///
/// Index segments are synthetic: they exist for change detection and error
/// reporting, and say nothing about order on re-encode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// Path to a top-level field.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Field(name.into())],
        }
    }

    /// Extend with a named child.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.segments.push(Segment::Field(name.into()));
        next
    }

    /// Extend with an element index.
    pub fn index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.segments.push(Segment::Index(index));
        next
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path with index segments removed, identifying the schema field rather
    /// than a concrete element (`ip_range.0.start_ip` -> `ip_range.start_ip`).
    pub fn schema_key(&self) -> String {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Field(name) => Some(name.as_str()),
                Segment::Index(_) => None,
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            if idx > 0 {
                write!(f, ".")?;
            }
            match segment {
                Segment::Field(name) => write!(f, "{name}")?,
                Segment::Index(i) => write!(f, "{i}")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let segments = raw
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|s| match s.parse::<usize>() {
                Ok(i) => Segment::Index(i),
                Err(_) => Segment::Field(s.to_string()),
            })
            .collect();
        Ok(Self { segments })
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::FieldPath;

    #[test]
    fn renders_synthetic_index_path() {
        let path = FieldPath::root("ip_range").index(1).child("start_ip");
        assert_eq!(path.to_string(), "ip_range.1.start_ip");
        assert_eq!(path.schema_key(), "ip_range.start_ip");
    }

    #[test]
    fn parses_numeric_segments_as_indices() {
        let path: FieldPath = "options.0.code".parse().expect("infallible");
        assert_eq!(path, FieldPath::root("options").index(0).child("code"));
    }
}
