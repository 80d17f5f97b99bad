//! Engine Module
//!
//! The content store that coordinates all components.
//!
//! ## Responsibilities
//! - Read full content items (header + metadata + payload)
//! - Create nodes, JSON leaves and binary leaves
//! - Update items, renaming first when the name changed
//! - Metadata-only updates
//!
//! ## Write Ordering
//! ```text
//!   validate + classify  ->  rename (payload, then leaf sidecar)
//!                        ->  payload write
//!                        ->  sidecar write
//! ```
//! Nothing is mutated before classification succeeds. A failure in the
//! sidecar step after the payload step is reported as
//! [`StoreError::MetadataWrite`].

use std::fs::{self, File};
use std::path::Path;

use bytes::Bytes;

use crate::config::Config;
use crate::constants::{FALLBACK_MEDIA_TYPE, STRUCTURED_MEDIA_TYPE};
use crate::content::classifier::is_structured_media_type;
use crate::content::{Content, ContentHeader, Document, HeaderResolver, Payload, PayloadIo};
use crate::error::{Result, StoreError};
use crate::lock::{PathGuard, PathLocks};
use crate::metadata::{MetaData, MetaDatum, MetadataStore};
use crate::resolver::{ContentPath, PathResolver, StorageHandle};

/// A leaf payload after classification
enum LeafPayload {
    Structured(Document),
    Binary { bytes: Bytes, media_type: String },
}

/// The content store
///
/// ## Concurrency Model
///
/// Every operation runs to completion on the calling thread.
///
/// - **Writes** (create/write/write_metadata_only): when `lock_writes` is
///   set, hold the locks of every logical path they touch (a rename touches
///   two). Writers of unrelated paths never wait on each other.
/// - **Reads**: never lock. A read racing a write may observe the new
///   payload with the old metadata.
pub struct ContentStore {
    /// Store configuration
    config: Config,

    /// Logical path -> storage location
    resolver: PathResolver,

    /// Sidecar metadata and inheritance
    metadata: MetadataStore,

    /// Header derivation
    headers: HeaderResolver,

    /// Payload reads and writes
    payloads: PayloadIo,

    /// Per-path write locks, `None` when disabled
    locks: Option<PathLocks>,
}

impl ContentStore {
    /// Open or create a store with the given config
    ///
    /// Creates the storage root if it does not exist.
    pub fn open(config: Config) -> Result<Self> {
        let resolver = PathResolver::new(&config.storage_root)?;
        let metadata = MetadataStore::new(resolver.clone());
        let headers = HeaderResolver::new(resolver.clone(), metadata.clone());
        let payloads = PayloadIo::new(resolver.clone());
        let locks = config.lock_writes.then(PathLocks::new);

        tracing::info!(
            "Content store opened at {} (write locking: {})",
            resolver.root().display(),
            config.lock_writes
        );

        Ok(Self {
            config,
            resolver,
            metadata,
            headers,
            payloads,
            locks,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified storage root
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().storage_root(path).build())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Read the full item at `path`
    ///
    /// Nodes and JSON leaves come back as [`Payload::Structured`], every other
    /// leaf as [`Payload::Binary`].
    pub fn read(&self, path: &str) -> Result<Content> {
        let path = ContentPath::parse(path)?;

        let header = self.headers.header_for(&path)?;
        let payload = if header.is_structured()? {
            Payload::Structured(self.payloads.read_document(&path)?)
        } else {
            Payload::Binary(self.payloads.read_bytes(&path)?)
        };
        let metadata = self.metadata.load(&path)?;

        tracing::debug!("Read {} ({:?})", path, header.kind);
        Ok(Content {
            header,
            metadata,
            payload,
        })
    }

    /// Header of the item at `path`
    pub fn load_header(&self, path: &str) -> Result<ContentHeader> {
        self.headers.header_for(&ContentPath::parse(path)?)
    }

    /// Effective metadata of the item at `path`
    pub fn load_metadata(&self, path: &str) -> Result<MetaData> {
        self.metadata.load(&ContentPath::parse(path)?)
    }

    /// Open the raw bytes of the leaf at `path`, whatever its media type
    pub fn load_payload(&self, path: &str) -> Result<File> {
        self.payloads.open(&ContentPath::parse(path)?)
    }

    /// Media type to serve the raw bytes of the leaf at `path` with
    ///
    /// Falls back to `application/octet-stream` when none is recorded.
    pub fn payload_media_type(&self, path: &str) -> Result<String> {
        let path = ContentPath::parse(path)?;
        let handle = self.resolver.resolve(&path)?;
        if handle.is_node() {
            return Err(StoreError::NotALeaf(path.to_string()));
        }

        let local = self.metadata.read_local(&path)?;
        Ok(local.media_type().unwrap_or(FALLBACK_MEDIA_TYPE).to_string())
    }

    /// Headers of the children of the node at `path`
    pub fn list_children(&self, path: &str) -> Result<Vec<ContentHeader>> {
        let children = self.resolver.list_children(&ContentPath::parse(path)?)?;
        Ok(children.iter().map(HeaderResolver::header_for_handle).collect())
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Create `content` as a new child of the node at `parent`
    ///
    /// JSON leaves are stamped `application/json`, binary leaves with their
    /// declared media type. Returns the new item's path.
    pub fn create(&self, parent: &str, content: Content) -> Result<ContentPath> {
        let parent = ContentPath::parse(parent)?;
        let Content {
            header,
            metadata,
            payload,
        } = content;

        PathResolver::validate_item_name(&header.name)?;
        let new_path = parent.join(&header.name)?;
        let _guard = self.lock(&[&new_path]);

        let mut metadata = metadata.local_only();

        if header.is_node() {
            self.resolver.create_directory(&parent, &header.name)?;
            self.persist_metadata(&new_path, &metadata)?;
            tracing::debug!("Created node {}", new_path);
            return Ok(new_path);
        }

        let leaf = Self::classify_leaf(&new_path, &header, payload, None)?;

        let parent_handle = self.resolver.resolve(&parent)?;
        if !parent_handle.is_node() {
            return Err(StoreError::NotADirectory(parent.to_string()));
        }
        if self.resolver.exists(&new_path) {
            return Err(StoreError::AlreadyExists(new_path.to_string()));
        }

        self.write_leaf_payload(&new_path, leaf, &mut metadata)?;
        self.persist_metadata(&new_path, &metadata)?;

        tracing::debug!(
            "Created leaf {} ({:?})",
            new_path,
            metadata.media_type()
        );
        Ok(new_path)
    }

    /// Update the item at `path` with `content`
    ///
    /// A changed header name renames the item (and a leaf's sidecar) before
    /// anything else is written; an empty name keeps the current one. Nodes
    /// take no payload. Returns the item's final path.
    pub fn write(&self, path: &str, content: Content) -> Result<ContentPath> {
        let path = ContentPath::parse(path)?;
        let Content {
            header,
            metadata,
            payload,
        } = content;

        let renamed = !header.name.is_empty() && path.name() != Some(header.name.as_str());
        let target = if renamed {
            PathResolver::validate_item_name(&header.name)?;
            path.with_name(&header.name)?
        } else {
            path.clone()
        };
        let _guard = self.lock(&[&path, &target]);

        let handle = self.resolver.resolve(&path)?;
        let mut metadata = metadata.local_only();

        let leaf = if handle.is_node() {
            None
        } else {
            let stored = self.metadata.read_local(&path)?;
            Some(Self::classify_leaf(
                &path,
                &header,
                payload,
                stored.media_type(),
            )?)
        };

        let path = if renamed {
            self.rename(&handle, &header.name)?
        } else {
            path
        };

        if let Some(leaf) = leaf {
            self.write_leaf_payload(&path, leaf, &mut metadata)?;
        }
        self.persist_metadata(&path, &metadata)?;

        tracing::debug!("Wrote {}", path);
        Ok(path)
    }

    /// Replace the metadata entries of the item at `path`, leaving its
    /// payload and media type untouched
    ///
    /// Entries flagged `inherited` are not stored.
    pub fn write_metadata_only(
        &self,
        path: &str,
        entries: impl IntoIterator<Item = MetaDatum>,
    ) -> Result<()> {
        let path = ContentPath::parse(path)?;
        let _guard = self.lock(&[&path]);

        let mut metadata = self.metadata.load(&path)?;
        metadata.set_entries(entries);
        self.metadata.write(&path, &metadata.local_only())
    }

    /// Close the store
    ///
    /// Removes the storage root when `delete_on_shutdown` is set.
    pub fn close(self) -> Result<()> {
        if self.config.delete_on_shutdown {
            fs::remove_dir_all(self.resolver.root())?;
            tracing::info!("Deleted storage root {}", self.resolver.root().display());
        }
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Canonical storage root
    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The metadata store backing this content store
    pub fn metadata_store(&self) -> &MetadataStore {
        &self.metadata
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn lock(&self, paths: &[&ContentPath]) -> Option<PathGuard> {
        self.locks.as_ref().map(|locks| locks.lock(paths))
    }

    /// Decide how a leaf payload is stored, without touching storage
    ///
    /// The media type comes from the header, else from `stored`; a structured
    /// payload without either is taken as JSON.
    fn classify_leaf(
        path: &ContentPath,
        header: &ContentHeader,
        payload: Payload,
        stored: Option<&str>,
    ) -> Result<LeafPayload> {
        let media_type = match header.media_type.as_deref().or(stored) {
            Some(media_type) => media_type.to_string(),
            None if payload.is_structured() => STRUCTURED_MEDIA_TYPE.to_string(),
            None => return Err(StoreError::MissingMediaType(path.to_string())),
        };

        if is_structured_media_type(&media_type) {
            return match payload {
                Payload::Structured(document) => Ok(LeafPayload::Structured(document)),
                Payload::Binary(bytes) => Ok(LeafPayload::Structured(serde_json::from_slice(&bytes)?)),
            };
        }

        match payload {
            Payload::Binary(bytes) => Ok(LeafPayload::Binary { bytes, media_type }),
            Payload::Structured(_) => Err(StoreError::PayloadMismatch {
                path: path.to_string(),
                media_type,
            }),
        }
    }

    /// Write the payload and stamp its media type into `metadata`
    fn write_leaf_payload(
        &self,
        path: &ContentPath,
        leaf: LeafPayload,
        metadata: &mut MetaData,
    ) -> Result<()> {
        match leaf {
            LeafPayload::Structured(document) => {
                metadata.set_media_type(STRUCTURED_MEDIA_TYPE);
                self.payloads.write_document(path, &document)?;
            }
            LeafPayload::Binary { bytes, media_type } => {
                metadata.set_media_type(media_type);
                self.payloads.write_bytes(path, &bytes)?;
            }
        }
        Ok(())
    }

    /// Rename an item; a leaf's sidecar follows it
    fn rename(&self, handle: &StorageHandle, new_name: &str) -> Result<ContentPath> {
        let new_path = self.resolver.rename(handle.path(), new_name)?;

        if !handle.is_node() {
            if let Err(e) = self.metadata.rename_sidecar(handle.path(), new_name) {
                tracing::warn!("Renamed {} but not its sidecar: {}", handle.path(), e);
                return Err(StoreError::MetadataWrite {
                    path: new_path.to_string(),
                    source: Box::new(e),
                });
            }
        }

        Ok(new_path)
    }

    /// Persist the sidecar after a successful payload step
    fn persist_metadata(&self, path: &ContentPath, metadata: &MetaData) -> Result<()> {
        self.metadata.write(path, metadata).map_err(|e| {
            tracing::warn!("Payload of {} written but metadata failed: {}", path, e);
            StoreError::MetadataWrite {
                path: path.to_string(),
                source: Box::new(e),
            }
        })
    }
}
