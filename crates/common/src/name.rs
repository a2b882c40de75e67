//! Dotted variable paths.

use std::fmt;
use std::rc::Rc;

/// A variable path such as `a.b.c`, stored as its segments.
///
/// Paths are resolved one segment at a time, left to right. The empty path
/// is used by `EnterContext` for anonymous contexts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Name {
    segments: Rc<[String]>,
}

impl Name {
    /// The empty path.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a path from individual segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Split dotted text into a path. Empty segments are dropped, so
    /// `""` parses to the empty path.
    pub fn parse(text: &str) -> Self {
        Self::from_segments(text.split('.').filter(|s| !s.is_empty()))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn first(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Split off the final segment: `a.b.c` → (`a.b`, `c`).
    pub fn split_last(&self) -> Option<(Name, &str)> {
        let (last, init) = self.segments.split_last()?;
        Some((Name::from_segments(init.iter().cloned()), last.as_str()))
    }
}

impl From<&str> for Name {
    fn from(text: &str) -> Self {
        Name::parse(text)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}
