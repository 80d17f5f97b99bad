//! Payload I/O
//!
//! Reads and writes the bytes of an item in its classified representation.
//! Says nothing about metadata; that is the caller's job.

use std::fs::{self, File};

use bytes::Bytes;
use serde_json::Value;

use crate::constants::LISTING_KEY;
use crate::error::{Result, StoreError};
use crate::resolver::{ContentPath, PathResolver, StorageHandle};

use super::{Document, HeaderResolver};

/// Structured and binary payload access
#[derive(Debug, Clone)]
pub struct PayloadIo {
    resolver: PathResolver,
}

impl PayloadIo {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    /// Structured payload of `path`
    ///
    /// A node yields its child listing `{"sub": [header, ...]}`; a leaf is
    /// parsed as a JSON object.
    pub fn read_document(&self, path: &ContentPath) -> Result<Document> {
        let handle = self.resolver.resolve(path)?;
        if handle.is_node() {
            return self.listing(&handle);
        }

        let bytes = fs::read(handle.location())?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Raw bytes of the leaf at `path`
    pub fn read_bytes(&self, path: &ContentPath) -> Result<Bytes> {
        let handle = self.leaf(path)?;
        Ok(Bytes::from(fs::read(handle.location())?))
    }

    /// Open the leaf at `path` for streaming
    pub fn open(&self, path: &ContentPath) -> Result<File> {
        let handle = self.leaf(path)?;
        Ok(File::open(handle.location())?)
    }

    /// Overwrite (or create) the leaf at `path` with a JSON document
    pub fn write_document(&self, path: &ContentPath, document: &Document) -> Result<u64> {
        let bytes = serde_json::to_vec_pretty(document)?;
        self.write_bytes(path, &bytes)
    }

    /// Overwrite (or create) the leaf at `path` with raw bytes
    ///
    /// Returns the number of bytes written.
    pub fn write_bytes(&self, path: &ContentPath, bytes: &[u8]) -> Result<u64> {
        let handle = self.resolver.resolve_or_create(path)?;
        if handle.is_node() {
            return Err(StoreError::NotALeaf(path.to_string()));
        }

        fs::write(handle.location(), bytes)?;
        tracing::debug!("Wrote {} bytes to {}", bytes.len(), path);

        Ok(bytes.len() as u64)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn leaf(&self, path: &ContentPath) -> Result<StorageHandle> {
        let handle = self.resolver.resolve(path)?;
        if handle.is_node() {
            return Err(StoreError::NotALeaf(path.to_string()));
        }
        Ok(handle)
    }

    fn listing(&self, handle: &StorageHandle) -> Result<Document> {
        let children = self
            .resolver
            .list_children(handle.path())?
            .iter()
            .map(|child| serde_json::to_value(HeaderResolver::header_for_handle(child)))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut document = Document::new();
        document.insert(LISTING_KEY.to_string(), Value::Array(children));
        Ok(document)
    }
}
