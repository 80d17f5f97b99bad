//! Logical content paths
//!
//! `/`-separated, absolute from the storage root. Validation happens once at
//! parse time so that every `ContentPath` maps to a location inside the root.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Result, StoreError};

/// A validated, absolute logical path
///
/// The root is `/` and has no segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ContentPath {
    segments: Vec<String>,
}

impl ContentPath {
    /// The root path `/`
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a logical path
    ///
    /// Empty and `.` segments are dropped, so `a//b/./c` and `/a/b/c` are the
    /// same path. `..` is rejected rather than resolved.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut segments = Vec::new();
        for segment in raw.split('/') {
            if segment.is_empty() || segment == "." {
                continue;
            }
            Self::validate_segment(segment)?;
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Check that `name` is usable as a single path segment
    pub fn validate_segment(name: &str) -> Result<()> {
        if name.is_empty() || name == "." || name == ".." {
            return Err(StoreError::InvalidPath(format!(
                "'{}' is not a valid name",
                name
            )));
        }
        if name.contains('/') || name.contains('\\') || name.contains('\0') {
            return Err(StoreError::InvalidPath(format!(
                "'{}' must not contain separators or NUL",
                name
            )));
        }
        Ok(())
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments below the root
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Terminal segment, `None` for the root
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Parent path, `None` for the root
    pub fn parent(&self) -> Option<ContentPath> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Append one validated segment
    pub fn join(&self, name: &str) -> Result<ContentPath> {
        Self::validate_segment(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(Self { segments })
    }

    /// Same parent, different terminal segment
    pub fn with_name(&self, name: &str) -> Result<ContentPath> {
        match self.parent() {
            Some(parent) => parent.join(name),
            None => Err(StoreError::InvalidPath("the root cannot be renamed".into())),
        }
    }

    /// Every proper ancestor, root first, down to the immediate parent
    ///
    /// `/a/b/c` yields `/`, `/a`, `/a/b`. The root has no ancestors.
    pub fn ancestors(&self) -> Vec<ContentPath> {
        (0..self.segments.len())
            .map(|len| Self {
                segments: self.segments[..len].to_vec(),
            })
            .collect()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Physical location of this path under `root`
    pub fn to_location(&self, root: &Path) -> PathBuf {
        let mut location = root.to_path_buf();
        for segment in &self.segments {
            location.push(segment);
        }
        location
    }
}

impl fmt::Display for ContentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for ContentPath {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
