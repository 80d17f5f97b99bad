//! Content header derivation.

use crate::error::{Result, StoreError};
use crate::metadata::MetadataStore;
use crate::resolver::{ContentPath, PathResolver, StorageHandle};

use super::ContentHeader;

/// Derives [`ContentHeader`]s from storage state and leaf metadata
#[derive(Debug, Clone)]
pub struct HeaderResolver {
    resolver: PathResolver,
    metadata: MetadataStore,
}

impl HeaderResolver {
    pub fn new(resolver: PathResolver, metadata: MetadataStore) -> Self {
        Self { resolver, metadata }
    }

    /// Full header of the item at `path`
    ///
    /// Leaves take their media type from their own sidecar and fail with
    /// `MissingMediaType` when it records none.
    pub fn header_for(&self, path: &ContentPath) -> Result<ContentHeader> {
        let handle = self.resolver.resolve(path)?;
        let mut header = Self::header_for_handle(&handle);

        if !handle.is_node() {
            let local = self.metadata.read_local(path)?;
            let media_type = local
                .media_type()
                .ok_or_else(|| StoreError::MissingMediaType(path.to_string()))?;
            header.media_type = Some(media_type.to_string());
        }

        Ok(header)
    }

    /// Kind, name and size from storage alone
    ///
    /// Used for child listings, where touching every child's sidecar is not
    /// wanted.
    pub fn header_for_handle(handle: &StorageHandle) -> ContentHeader {
        let header = if handle.is_node() {
            ContentHeader::node(handle.name())
        } else {
            ContentHeader::leaf(handle.name())
        };

        ContentHeader {
            size: (!handle.is_node()).then_some(handle.len()),
            ..header
        }
    }
}
