//! Addressable locations inside a config tree.
//!
//! A [`ContextPath`] renders as `$`, `$.storage`, `$.storage.files[0].path`.
//! Paths are immutable: [`ContextPath::append`] returns a new path and leaves
//! the parent untouched, so a walker can hand the same prefix to every child.

use serde::{Serialize, Serializer};
use std::fmt;

/// One step below a node: a named field or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Field(String),
    Index(usize),
}

impl From<&str> for Segment {
    fn from(name: &str) -> Self {
        Segment::Field(name.to_string())
    }
}

impl From<String> for Segment {
    fn from(name: String) -> Self {
        Segment::Field(name)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

/// Ordered sequence of segments from the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ContextPath {
    segments: Vec<Segment>,
}

impl ContextPath {
    /// The document root, rendered as `$`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from a list of segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Segment>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// New path with one more segment.
    pub fn append(&self, segment: impl Into<Segment>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// New path with all of `other`'s segments after this path's.
    pub fn join(&self, other: &ContextPath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for ContextPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            match segment {
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl Serialize for ContextPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Shorthand for building a relative path: `path!["contents", "source"]`.
#[macro_export]
macro_rules! path {
    () => { $crate::path::ContextPath::root() };
    ($($seg:expr),+ $(,)?) => {
        $crate::path::ContextPath::root()$(.append($seg))+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_renders_as_dollar() {
        assert_eq!(ContextPath::root().to_string(), "$");
        assert!(ContextPath::root().is_root());
    }

    #[test]
    fn renders_fields_and_indices() {
        let path = ContextPath::root()
            .append("storage")
            .append("files")
            .append(0usize)
            .append("path");
        assert_eq!(path.to_string(), "$.storage.files[0].path");
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn append_leaves_parent_untouched() {
        let parent = ContextPath::root().append("systemd");
        let first = parent.append("units");
        let second = parent.append("dropins");
        assert_eq!(parent.to_string(), "$.systemd");
        assert_eq!(first.to_string(), "$.systemd.units");
        assert_eq!(second.to_string(), "$.systemd.dropins");
    }

    #[test]
    fn join_reroots_relative_path() {
        let prefix = ContextPath::from_segments(["storage", "files"]).append(2usize);
        let relative = crate::path!["contents", "source"];
        assert_eq!(
            prefix.join(&relative).to_string(),
            "$.storage.files[2].contents.source"
        );
        assert_eq!(prefix.join(&ContextPath::root()), prefix);
    }

    #[test]
    fn serializes_as_rendered_string() {
        let path = crate::path!["ignition", "version"];
        assert_eq!(
            serde_json::to_value(&path).unwrap(),
            serde_json::json!("$.ignition.version")
        );
    }
}
