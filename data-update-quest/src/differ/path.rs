//! Raw diff paths and dotted field paths.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

/// One step in a raw diff path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a raw difference inside a schema tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DiffPath {
    segments: Vec<PathSegment>,
}

impl DiffPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self { segments }
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }
}

impl From<Vec<PathSegment>> for DiffPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }
}

/// Nested-bracket notation: `root['properties']['age']['type']`.
impl fmt::Display for DiffPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "root")?;
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) => write!(f, "['{}']", key.replace('\'', "\\'"))?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Dotted sequence of property names, e.g. `user.address.street`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn child(&self, name: &str) -> Self {
        let mut names = self.0.clone();
        names.push(name.to_string());
        Self(names)
    }

    /// Walk `properties` maps from `schema` down to this field's definition.
    pub fn definition<'a>(&self, schema: &'a Value) -> Option<&'a Value> {
        self.0
            .iter()
            .try_fold(schema, |node, name| node.get("properties")?.get(name))
    }

    /// Declared `type` of this field in `schema`, if any.
    pub fn declared_type<'a>(&self, schema: &'a Value) -> Option<&'a Value> {
        self.definition(schema)?.get("type")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
