//! Content Module
//!
//! The unit of transfer between the store and its callers.
//!
//! ## Responsibilities
//! - Describe items ([`ContentHeader`]) from storage state plus metadata
//! - Classify payloads as structured (JSON) or binary
//! - Read and write payloads in the classified representation
//!
//! ## Shape
//! ```text
//! ┌───────────────────────────── Content ─────────────────────────────┐
//! │ header:   name, kind (LEAF|NODE), mediaType?, size?               │
//! │ metadata: mediaType?, entries [{key, value, inherited}]           │
//! │ payload:  Structured(JSON object) | Binary(bytes)                 │
//! └───────────────────────────────────────────────────────────────────┘
//! ```

pub mod classifier;
mod header;
mod payload;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::constants::STRUCTURED_MEDIA_TYPE;
use crate::error::Result;
use crate::metadata::MetaData;
use crate::resolver::ItemKind;

pub use header::HeaderResolver;
pub use payload::PayloadIo;

/// A structured payload: one JSON object
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Descriptive attributes of one item
///
/// Derived from storage on every read, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentHeader {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ItemKind,

    /// Leaves only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// Leaves only, in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl ContentHeader {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ItemKind::Leaf,
            media_type: None,
            size: None,
        }
    }

    pub fn node(name: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Node,
            ..Self::leaf(name)
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn is_node(&self) -> bool {
        self.kind == ItemKind::Node
    }

    /// See [`classifier::is_structured`]
    pub fn is_structured(&self) -> Result<bool> {
        classifier::is_structured(self)
    }
}

/// Payload of an item
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A JSON object (node listings and JSON leaves)
    Structured(Document),

    /// Raw bytes
    Binary(Bytes),
}

impl Payload {
    pub fn is_structured(&self) -> bool {
        matches!(self, Payload::Structured(_))
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Payload::Structured(document) => Some(document),
            Payload::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Payload::Binary(bytes) => Some(bytes),
            Payload::Structured(_) => None,
        }
    }
}

/// Header, metadata and payload of one item
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub header: ContentHeader,
    pub metadata: MetaData,
    pub payload: Payload,
}

impl Content {
    /// A folder to be created; it carries no payload
    pub fn node(name: impl Into<String>) -> Self {
        Self {
            header: ContentHeader::node(name),
            metadata: MetaData::new(),
            payload: Payload::Structured(Document::new()),
        }
    }

    /// A JSON leaf
    pub fn document(name: impl Into<String>, document: Document) -> Self {
        Self {
            header: ContentHeader::leaf(name).with_media_type(STRUCTURED_MEDIA_TYPE),
            metadata: MetaData::new(),
            payload: Payload::Structured(document),
        }
    }

    /// An uploaded file: original file name, declared media type and bytes
    pub fn upload(
        name: impl Into<String>,
        media_type: Option<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            header: ContentHeader {
                media_type,
                ..ContentHeader::leaf(name)
            },
            metadata: MetaData::new(),
            payload: Payload::Binary(bytes.into()),
        }
    }

    pub fn with_metadata(mut self, metadata: MetaData) -> Self {
        self.metadata = metadata;
        self
    }
}
