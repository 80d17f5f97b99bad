//! Filesystem-backed path resolution.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::constants::SIDECAR_MARKER;
use crate::error::{Result, StoreError};

use super::{ContentPath, ItemKind, StorageHandle};

/// Resolves logical paths against a storage root
///
/// Holds no state besides the canonical root, so all methods take `&self`
/// and can be called from any number of threads.
#[derive(Debug, Clone)]
pub struct PathResolver {
    /// Canonical storage root
    root: PathBuf,
}

impl PathResolver {
    /// Open a resolver on `root`, creating the directory if needed
    pub fn new(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;

        if !root.is_dir() {
            return Err(StoreError::Config(format!(
                "storage root is not a directory: {}",
                root.display()
            )));
        }

        Ok(Self {
            root: root.canonicalize()?,
        })
    }

    /// Canonical storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look up an existing entry
    ///
    /// Sidecar files are not content: a path naming one, or passing through
    /// a leaf, is `NotFound`.
    pub fn resolve(&self, path: &ContentPath) -> Result<StorageHandle> {
        if path.segments().any(Self::is_sidecar_name) {
            return Err(StoreError::NotFound(path.to_string()));
        }
        let location = path.to_location(&self.root);

        let metadata = match fs::metadata(&location) {
            Ok(metadata) => metadata,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                return Err(StoreError::NotFound(path.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        self.ensure_within_root(path, &location)?;

        let (kind, len) = if metadata.is_dir() {
            (ItemKind::Node, 0)
        } else {
            (ItemKind::Leaf, metadata.len())
        };

        Ok(StorageHandle::new(path.clone(), location, kind, len))
    }

    /// Whether an entry exists at `path`
    pub fn exists(&self, path: &ContentPath) -> bool {
        path.to_location(&self.root).exists()
    }

    /// Look up an entry, creating an empty leaf when it is absent
    ///
    /// The immediate parent must already exist and be a node.
    pub fn resolve_or_create(&self, path: &ContentPath) -> Result<StorageHandle> {
        if let Some(name) = path.name() {
            Self::validate_item_name(name)?;
        }

        match self.resolve(path) {
            Err(StoreError::NotFound(_)) => {}
            other => return other,
        }

        let name = path
            .name()
            .ok_or_else(|| StoreError::InvalidPath("the root cannot be created".into()))?;
        let parent = self.parent_node(path)?;
        let location = parent.location().join(name);

        match OpenOptions::new().write(true).create_new(true).open(&location) {
            Ok(_) => tracing::debug!("Created empty leaf {}", path),
            // Lost a creation race; the entry exists now either way
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }

        self.resolve(path)
    }

    /// Create a directory `name` under the node at `parent`
    pub fn create_directory(&self, parent: &ContentPath, name: &str) -> Result<StorageHandle> {
        Self::validate_item_name(name)?;
        let path = parent.join(name)?;
        self.parent_node(&path)?;

        if self.exists(&path) {
            return Err(StoreError::AlreadyExists(path.to_string()));
        }

        fs::create_dir(path.to_location(&self.root))?;
        tracing::debug!("Created node {}", path);

        self.resolve(&path)
    }

    /// Rename the terminal segment of `path`, keeping its parent
    ///
    /// Returns the new logical path. Renaming to the current name is a no-op.
    pub fn rename(&self, path: &ContentPath, new_name: &str) -> Result<ContentPath> {
        Self::validate_item_name(new_name)?;
        let handle = self.resolve(path)?;
        let new_path = path.with_name(new_name)?;

        if new_path == *path {
            return Ok(new_path);
        }
        if self.exists(&new_path) {
            return Err(StoreError::AlreadyExists(new_path.to_string()));
        }

        fs::rename(handle.location(), new_path.to_location(&self.root))?;
        tracing::debug!("Renamed {} -> {}", path, new_path);

        Ok(new_path)
    }

    /// List the children of the node at `path`, sorted by name
    ///
    /// Sidecar files are not content and are skipped.
    pub fn list_children(&self, path: &ContentPath) -> Result<Vec<StorageHandle>> {
        let handle = self.resolve(path)?;
        if !handle.is_node() {
            return Err(StoreError::NotADirectory(path.to_string()));
        }

        let mut children = Vec::new();
        for entry in fs::read_dir(handle.location())? {
            let entry = entry?;
            let file_name = entry.file_name();

            let Some(name) = file_name.to_str() else {
                tracing::warn!("Skipping non UTF-8 entry {:?} in {}", file_name, path);
                continue;
            };
            if Self::is_sidecar_name(name) {
                continue;
            }

            let child_path = match path.join(name) {
                Ok(child_path) => child_path,
                Err(e) => {
                    tracing::warn!("Skipping entry {:?} in {}: {}", name, path, e);
                    continue;
                }
            };

            let metadata = entry.metadata()?;
            let (kind, len) = if metadata.is_dir() {
                (ItemKind::Node, 0)
            } else {
                (ItemKind::Leaf, metadata.len())
            };
            children.push(StorageHandle::new(child_path, entry.path(), kind, len));
        }

        children.sort_by(|a, b| a.path().cmp(b.path()));
        Ok(children)
    }

    /// Check that `name` can name a content item
    ///
    /// Names ending with the sidecar marker are reserved.
    pub fn validate_item_name(name: &str) -> Result<()> {
        ContentPath::validate_segment(name)?;
        if Self::is_sidecar_name(name) {
            return Err(StoreError::InvalidPath(format!(
                "'{}' is reserved for metadata sidecars",
                name
            )));
        }
        Ok(())
    }

    /// Whether `name` is a sidecar file name
    pub fn is_sidecar_name(name: &str) -> bool {
        name.ends_with(SIDECAR_MARKER)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Resolve the parent of `path` and require it to be a node
    fn parent_node(&self, path: &ContentPath) -> Result<StorageHandle> {
        let parent = path
            .parent()
            .ok_or_else(|| StoreError::InvalidPath("the root has no parent".into()))?;
        let handle = self.resolve(&parent)?;
        if !handle.is_node() {
            return Err(StoreError::NotADirectory(parent.to_string()));
        }
        Ok(handle)
    }

    /// Reject locations that leave the root through a symlink
    fn ensure_within_root(&self, path: &ContentPath, location: &Path) -> Result<()> {
        if path.is_root() {
            return Ok(());
        }
        let canonical = location.canonicalize()?;
        if !canonical.starts_with(&self.root) {
            return Err(StoreError::InvalidPath(format!(
                "{} resolves outside the storage root",
                path
            )));
        }
        Ok(())
    }
}
