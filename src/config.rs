//! Configuration for the content store
//!
//! Resolved once at startup and passed into [`ContentStore::open`].
//!
//! [`ContentStore::open`]: crate::engine::ContentStore::open

use std::path::PathBuf;

/// Main configuration for a content store instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory that logical path `/` maps onto
    /// Internal structure:
    ///   {storage_root}/
    ///     ├── .metadata.json          (root node sidecar)
    ///     ├── folder/
    ///     │   ├── .metadata.json      (node sidecar)
    ///     │   ├── doc.json
    ///     │   └── doc.json.metadata.json  (leaf sidecar)
    ///     └── ...
    pub storage_root: PathBuf,

    /// Remove the whole storage root when the store is closed
    pub delete_on_shutdown: bool,

    // -------------------------------------------------------------------------
    // Concurrency Configuration
    // -------------------------------------------------------------------------
    /// Serialize writers per logical path
    pub lock_writes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("./content_data"),
            delete_on_shutdown: false,
            lock_writes: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the storage root directory
    pub fn storage_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage_root = path.into();
        self
    }

    /// Delete the storage root on [`close`](crate::engine::ContentStore::close)
    pub fn delete_on_shutdown(mut self, enabled: bool) -> Self {
        self.config.delete_on_shutdown = enabled;
        self
    }

    /// Enable or disable per-path write locking
    pub fn lock_writes(mut self, enabled: bool) -> Self {
        self.config.lock_writes = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
