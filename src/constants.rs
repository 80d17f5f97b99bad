//! Fixed names and media types shared across modules.

/// Appended to a leaf's file name, or used as the file name inside a node
pub const SIDECAR_MARKER: &str = ".metadata.json";

/// Media type stamped on every structured leaf
pub const STRUCTURED_MEDIA_TYPE: &str = "application/json";

/// Fallback media type when streaming a leaf without one
pub const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Key of the child header list in a node's synthesized document
pub const LISTING_KEY: &str = "sub";
