//! Path Resolver Module
//!
//! Maps logical content paths onto locations under the storage root.
//!
//! ## Responsibilities
//! - Parse and validate logical paths (no escaping the root)
//! - Existence-checked lookup and get-or-create of leaves
//! - Rename of the terminal segment in place
//! - Child listing of nodes (sidecar files are hidden)
//!
//! ## Mapping
//! ```text
//!   logical            physical
//!   /                  {root}
//!   /docs              {root}/docs
//!   /docs/a.json       {root}/docs/a.json
//! ```

mod fs;
mod path;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use fs::PathResolver;
pub use path::ContentPath;

/// Kind of a stored item, determined solely by the storage entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemKind {
    /// A file carrying a payload
    Leaf,

    /// A directory containing children
    Node,
}

/// Snapshot of one existing storage entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageHandle {
    path: ContentPath,
    location: PathBuf,
    kind: ItemKind,
    len: u64,
}

impl StorageHandle {
    pub(crate) fn new(path: ContentPath, location: PathBuf, kind: ItemKind, len: u64) -> Self {
        Self {
            path,
            location,
            kind,
            len,
        }
    }

    /// Logical path of the entry
    pub fn path(&self) -> &ContentPath {
        &self.path
    }

    /// Physical location under the storage root
    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn is_node(&self) -> bool {
        self.kind == ItemKind::Node
    }

    /// Byte length for leaves, 0 for nodes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Terminal segment, empty for the root
    pub fn name(&self) -> &str {
        self.path.name().unwrap_or("")
    }
}
