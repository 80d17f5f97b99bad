//! # sidecar-store
//!
//! A hierarchical content repository with:
//! - Logical `/`-paths mapped onto folders (nodes) and files (leaves)
//! - Key/value metadata in sidecar files, inherited down the hierarchy
//! - JSON vs binary classification of leaf payloads by media type
//! - Optional per-path write serialization
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Request Layer (caller)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ path + Content
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    ContentStore                              │
//! │        read / create / write / write_metadata_only           │
//! └──────┬──────────────┬───────────────┬───────────────┬───────┘
//!        │              │               │               │
//!        ▼              ▼               ▼               ▼
//!  ┌───────────┐ ┌────────────┐ ┌──────────────┐ ┌────────────┐
//!  │ Classifier│ │  Header    │ │   Payload    │ │  Metadata  │
//!  │ json/bin  │ │  Resolver  │ │     I/O      │ │   Store    │
//!  └───────────┘ └─────┬──────┘ └──────┬───────┘ └─────┬──────┘
//!                      │               │               │
//!                      ▼               ▼               ▼
//!               ┌─────────────────────────────────────────────┐
//!               │               Path Resolver                  │
//!               │          (storage root on disk)              │
//!               └─────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod constants;

pub mod resolver;
pub mod metadata;
pub mod content;
pub mod lock;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StoreError, Result};
pub use config::Config;
pub use content::{Content, ContentHeader, Document, Payload};
pub use engine::ContentStore;
pub use metadata::{MetaData, MetaDatum};
pub use resolver::{ContentPath, ItemKind};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of sidecar-store
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
