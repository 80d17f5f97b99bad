//! Sidecar-backed metadata store
//!
//! ## Responsibilities
//! - Locate the sidecar of a node or leaf (from its storage kind)
//! - Materialize an empty sidecar on first access
//! - Compute effective metadata: local entries over inherited ones
//! - Persist and rename sidecars

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::constants::SIDECAR_MARKER;
use crate::error::Result;
use crate::resolver::{ContentPath, ItemKind, PathResolver, StorageHandle};

use super::merge::{effective_entries, merge_first_wins, stamp_inherited};
use super::{MetaData, MetaDatum};

/// Reads and writes metadata sidecars
///
/// ## Concurrency:
/// - No internal state besides the resolver; all methods use `&self`
/// - Sidecar creation is idempotent, so concurrent first reads are safe
/// - Concurrent writes to one sidecar are last-write-wins unless the caller
///   serializes them
#[derive(Debug, Clone)]
pub struct MetadataStore {
    resolver: PathResolver,
}

impl MetadataStore {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    /// Effective metadata of `path`
    ///
    /// Local entries come first and always win; every remaining key is taken
    /// from the ancestors (see [`load_inherited_data`](Self::load_inherited_data)).
    /// A missing sidecar is created empty before merging.
    pub fn load(&self, path: &ContentPath) -> Result<MetaData> {
        let local = self.read_local(path)?;
        let inherited = self.load_inherited_data(path)?;

        let media_type = local.media_type().map(str::to_string);
        let entries = effective_entries(local.into_entries(), inherited);

        tracing::trace!("Loaded {} metadata entries for {}", entries.len(), path);
        Ok(MetaData::from_entries(media_type, entries))
    }

    /// Local entries of the sidecar at `path`, stamped as inherited
    ///
    /// This is what `path` contributes to its descendants.
    pub fn load_folder_metadata(&self, path: &ContentPath) -> Result<Vec<MetaDatum>> {
        let local = self.read_local(path)?;
        Ok(stamp_inherited(local.into_entries(), true))
    }

    /// Entries inherited by `path` from all of its ancestors
    ///
    /// Ancestors are visited from the root down to the immediate parent; the
    /// first ancestor to define a key keeps it, so a shallow ancestor wins
    /// over a deeper one.
    pub fn load_inherited_data(&self, path: &ContentPath) -> Result<Vec<MetaDatum>> {
        let layers = path
            .ancestors()
            .iter()
            .map(|ancestor| self.load_folder_metadata(ancestor))
            .collect::<Result<Vec<_>>>()?;

        Ok(merge_first_wins(layers).into_values().collect())
    }

    /// Sidecar contents of `path` alone, entries stamped local
    pub fn read_local(&self, path: &ContentPath) -> Result<MetaData> {
        let handle = self.resolver.resolve(path)?;
        let sidecar = self.ensure_exists(&handle)?;
        let metadata = Self::parse_sidecar(&sidecar)?;

        let media_type = metadata.media_type().map(str::to_string);
        Ok(MetaData::from_entries(
            media_type,
            stamp_inherited(metadata.into_entries(), false),
        ))
    }

    /// Persist `metadata` verbatim as the sidecar of `path`
    pub fn write(&self, path: &ContentPath, metadata: &MetaData) -> Result<()> {
        let handle = self.resolver.resolve(path)?;
        let sidecar = Self::sidecar_location(&handle);

        let bytes = serde_json::to_vec_pretty(metadata)?;
        fs::write(&sidecar, bytes)?;

        tracing::debug!(
            "Wrote metadata for {} ({} entries, media type {:?})",
            path,
            metadata.len(),
            metadata.media_type()
        );
        Ok(())
    }

    /// Move a leaf's sidecar along with a rename of the leaf to `new_name`
    ///
    /// Works on logical names only, so it may run before or after the leaf
    /// itself was renamed. Returns `false` when there was no sidecar to move.
    pub fn rename_sidecar(&self, old_path: &ContentPath, new_name: &str) -> Result<bool> {
        let new_path = old_path.with_name(new_name)?;
        let old_sidecar = Self::leaf_sidecar(&old_path.to_location(self.resolver.root()));
        let new_sidecar = Self::leaf_sidecar(&new_path.to_location(self.resolver.root()));

        match fs::rename(&old_sidecar, &new_sidecar) {
            Ok(()) => {
                tracing::debug!("Moved sidecar of {} to {}", old_path, new_path);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No sidecar to move for {}", old_path);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Create an empty sidecar for `handle` if it has none
    ///
    /// Idempotent. Returns the sidecar location.
    pub fn ensure_exists(&self, handle: &StorageHandle) -> Result<PathBuf> {
        let sidecar = Self::sidecar_location(handle);

        match OpenOptions::new().write(true).create_new(true).open(&sidecar) {
            Ok(mut file) => {
                let bytes = serde_json::to_vec_pretty(&MetaData::new())?;
                file.write_all(&bytes)?;
                tracing::debug!("Created empty sidecar for {}", handle.path());
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }

        Ok(sidecar)
    }

    /// Where the sidecar of `handle` lives
    ///
    /// Inside the directory for nodes, next to the file for leaves.
    pub fn sidecar_location(handle: &StorageHandle) -> PathBuf {
        match handle.kind() {
            ItemKind::Node => handle.location().join(SIDECAR_MARKER),
            ItemKind::Leaf => Self::leaf_sidecar(handle.location()),
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// `{location}.metadata.json`
    fn leaf_sidecar(location: &Path) -> PathBuf {
        let mut name = OsString::from(location.as_os_str());
        name.push(SIDECAR_MARKER);
        PathBuf::from(name)
    }

    fn parse_sidecar(sidecar: &Path) -> Result<MetaData> {
        let bytes = fs::read(sidecar)?;
        // A sidecar caught between creation and its first write
        if bytes.is_empty() {
            return Ok(MetaData::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}
