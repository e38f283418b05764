//! Dotted field paths
//!
//! Paths address a node inside a parsed document. Mapping keys and sequence
//! indices are both segments, so the second relationship's `from` field is
//! `relationships.1.from`. The document root renders as `(root)`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

const ROOT: &str = "(root)";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Path with a single key segment
    pub fn field(key: impl Into<String>) -> Self {
        Self::root().key(key)
    }

    /// Child path under a mapping key
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.into()));
        Self { segments }
    }

    /// Child path under a sequence index
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Replace `prefix` with `replacement`, or `None` when the path lies
    /// outside `prefix`.
    pub fn rebase(&self, prefix: &FieldPath, replacement: &FieldPath) -> Option<FieldPath> {
        if !self.starts_with(prefix) {
            return None;
        }
        let mut segments = replacement.segments.clone();
        segments.extend_from_slice(&self.segments[prefix.segments.len()..]);
        Some(Self { segments })
    }

    /// Last key segment, if the path ends in one
    pub fn leaf_key(&self) -> Option<&str> {
        match self.segments.last() {
            Some(PathSegment::Key(key)) => Some(key),
            _ => None,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str(ROOT);
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ROOT || s.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        for part in s.split('.') {
            if part.is_empty() {
                return Err(Error::InvalidPath(s.to_string()));
            }
            match part.parse::<usize>() {
                Ok(index) => segments.push(PathSegment::Index(index)),
                Err(_) => segments.push(PathSegment::Key(part.to_string())),
            }
        }
        Ok(Self { segments })
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
