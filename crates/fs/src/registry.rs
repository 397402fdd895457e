//! Protocol to filesystem resolution.

use parking_lot::RwLock;
use sluice_core::{ConfigMap, DatasetError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::path::canonical_protocol;
use crate::{FileSystem, LocalFileSystem, MemoryFileSystem, StoragePath};

/// Arguments a filesystem is constructed with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FsOptions {
    /// Protocol-specific credentials.
    pub credentials: ConfigMap,
    /// Extra backend arguments.
    pub fs_args: ConfigMap,
}

impl FsOptions {
    pub fn new(credentials: ConfigMap, fs_args: ConfigMap) -> Self {
        Self {
            credentials,
            fs_args,
        }
    }
}

/// Builds a filesystem for one protocol.
pub type FileSystemFactory =
    Arc<dyn Fn(&FsOptions) -> Result<Arc<dyn FileSystem>> + Send + Sync>;

/// Registry of filesystem factories keyed by canonical protocol.
pub struct FileSystemRegistry {
    factories: RwLock<HashMap<String, FileSystemFactory>>,
}

impl FileSystemRegistry {
    /// A registry with no protocols.
    pub fn empty() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// A registry serving `file` (local disk) and `memory` (one shared store).
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register("file", |_| Ok(Arc::new(LocalFileSystem::new()) as Arc<dyn FileSystem>));
        registry.register_instance("memory", Arc::new(MemoryFileSystem::new()));
        registry
    }

    /// Register a factory for `protocol`, replacing any previous one.
    pub fn register<F>(&self, protocol: impl Into<String>, factory: F)
    where
        F: Fn(&FsOptions) -> Result<Arc<dyn FileSystem>> + Send + Sync + 'static,
    {
        let protocol = protocol.into();
        debug!(protocol = %protocol, "filesystem registered");
        self.factories.write().insert(protocol, Arc::new(factory));
    }

    /// Serve `protocol` from a single shared instance.
    pub fn register_instance(&self, protocol: impl Into<String>, fs: Arc<dyn FileSystem>) {
        self.register(protocol, move |_| Ok(fs.clone()));
    }

    /// Build the filesystem serving `protocol` (aliases such as `s3a` resolve
    /// to their canonical protocol).
    pub fn resolve(&self, protocol: &str, options: &FsOptions) -> Result<Arc<dyn FileSystem>> {
        let canonical = canonical_protocol(protocol);
        let factory = self
            .factories
            .read()
            .get(canonical)
            .cloned()
            .ok_or_else(|| DatasetError::UnsupportedProtocol(protocol.to_string()))?;
        factory(options)
    }

    /// Build the filesystem serving the protocol of `path`.
    pub fn resolve_path(&self, path: &str, options: &FsOptions) -> Result<Arc<dyn FileSystem>> {
        self.resolve(StoragePath::parse(path).protocol(), options)
    }

    /// Registered protocols, sorted.
    pub fn protocols(&self) -> Vec<String> {
        let mut protocols: Vec<String> = self.factories.read().keys().cloned().collect();
        protocols.sort();
        protocols
    }
}

impl Default for FileSystemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FileSystemRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSystemRegistry")
            .field("protocols", &self.protocols())
            .finish()
    }
}
