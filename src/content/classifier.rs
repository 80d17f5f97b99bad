//! Content classification
//!
//! Decides whether an item's payload is a JSON document or opaque bytes.
//! Nodes are always structured: their payload is a synthesized listing.

use mime::Mime;

use crate::error::{Result, StoreError};
use crate::resolver::ItemKind;

use super::ContentHeader;

/// Whether the item described by `header` carries a structured payload
///
/// Fails with `MissingMediaType` for a leaf without a declared media type.
pub fn is_structured(header: &ContentHeader) -> Result<bool> {
    match header.kind {
        ItemKind::Node => Ok(true),
        ItemKind::Leaf => header
            .media_type
            .as_deref()
            .map(is_structured_media_type)
            .ok_or_else(|| StoreError::MissingMediaType(header.name.clone())),
    }
}

/// Whether `media_type` belongs to the JSON family
///
/// `application/json`, `text/json`, `application/hal+json` and wildcards that
/// cover `application/json` qualify. Unparseable types count as binary.
///
/// Broader than a strict compatibility check against `application/json`,
/// which would treat `text/json` and `+json` suffix types as binary.
pub fn is_structured_media_type(media_type: &str) -> bool {
    let Ok(parsed) = media_type.trim().parse::<Mime>() else {
        return false;
    };

    if parsed.subtype() == mime::JSON || parsed.suffix() == Some(mime::JSON) {
        return true;
    }

    parsed.subtype() == mime::STAR
        && (parsed.type_() == mime::STAR || parsed.type_() == mime::APPLICATION)
}
