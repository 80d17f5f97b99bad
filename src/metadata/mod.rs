//! Metadata Module
//!
//! Per-item key/value metadata kept in sidecar files, and the inheritance
//! rules that compute an item's effective metadata from its ancestors.
//!
//! ## Sidecar Layout
//! ```text
//!   node  /docs          -> {root}/docs/.metadata.json
//!   leaf  /docs/a.json   -> {root}/docs/a.json.metadata.json
//! ```
//!
//! ## Precedence
//! ```text
//!   local entry  >  shallowest ancestor  >  ...  >  immediate parent
//! ```
//! An ancestor closer to the root wins over a deeper one for the same key.

mod merge;
mod store;

use serde::{Deserialize, Serialize};

pub use merge::{effective_entries, merge_first_wins, stamp_inherited};
pub use store::MetadataStore;

/// One key/value metadata entry
///
/// Two entries are the same entry when their keys match, whatever their
/// values; see [`MetaDatum::same_entry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaDatum {
    pub key: String,
    pub value: String,

    /// Computed on load: true when the value comes from an ancestor
    #[serde(default)]
    pub inherited: bool,
}

impl MetaDatum {
    /// A local entry
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            inherited: false,
        }
    }

    /// An entry contributed by an ancestor
    pub fn inherited(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            inherited: true,
            ..Self::new(key, value)
        }
    }

    /// Key identity, the rule every merge is built on
    pub fn same_entry(&self, other: &MetaDatum) -> bool {
        self.key == other.key
    }
}

/// Metadata of one node or leaf
///
/// Entries are unique by key; adding an entry whose key is already present
/// keeps the existing one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SidecarDocument")]
pub struct MetaData {
    #[serde(skip_serializing_if = "Option::is_none")]
    media_type: Option<String>,
    entries: Vec<MetaDatum>,
}

impl MetaData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from entries, dropping later duplicates of a key
    pub fn from_entries(
        media_type: Option<String>,
        entries: impl IntoIterator<Item = MetaDatum>,
    ) -> Self {
        let mut metadata = Self {
            media_type,
            entries: Vec::new(),
        };
        metadata.extend(entries);
        metadata
    }

    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn set_media_type(&mut self, media_type: impl Into<String>) {
        self.media_type = Some(media_type.into());
    }

    pub fn entries(&self) -> &[MetaDatum] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<MetaDatum> {
        self.entries
    }

    /// Entry for `key`, if any
    pub fn get(&self, key: &str) -> Option<&MetaDatum> {
        self.entries.iter().find(|datum| datum.key == key)
    }

    /// Add an entry unless one with the same key exists
    ///
    /// Returns whether the entry was added.
    pub fn insert(&mut self, datum: MetaDatum) -> bool {
        if self.entries.iter().any(|existing| existing.same_entry(&datum)) {
            return false;
        }
        self.entries.push(datum);
        true
    }

    /// Replace the whole entry set, keeping the first entry per key
    pub fn set_entries(&mut self, entries: impl IntoIterator<Item = MetaDatum>) {
        self.entries.clear();
        self.extend(entries);
    }

    /// Copy holding only the item's own entries
    pub fn local_only(&self) -> MetaData {
        Self {
            media_type: self.media_type.clone(),
            entries: self
                .entries
                .iter()
                .filter(|datum| !datum.inherited)
                .cloned()
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn extend(&mut self, entries: impl IntoIterator<Item = MetaDatum>) {
        for datum in entries {
            self.insert(datum);
        }
    }
}

/// On-disk shape; deduplicated into [`MetaData`] when read
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SidecarDocument {
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    entries: Vec<MetaDatum>,
}

impl From<SidecarDocument> for MetaData {
    fn from(document: SidecarDocument) -> Self {
        MetaData::from_entries(document.media_type, document.entries)
    }
}
